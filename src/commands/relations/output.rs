//! Output formatting for relations command results.

use super::execute::RelationsResult;
use crate::output::{Outputable, push_failures};

impl Outputable for RelationsResult {
    fn to_table(&self) -> String {
        let mut blocks: Vec<String> = self
            .relationships
            .iter()
            .map(|r| {
                format!(
                    "-- {}.{} ({})\n{}",
                    r.entity_id,
                    r.name,
                    r.relation_type,
                    r.statements.join("\n")
                )
            })
            .collect();

        if blocks.is_empty() {
            blocks.push("-- No relationships.".to_string());
        }

        let mut out = blocks.join("\n\n");
        push_failures(&mut out, &self.failures);
        out
    }
}
