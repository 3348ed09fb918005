//! Output formatting for migrate command results.

use super::execute::MigrateResult;
use crate::output::{Outputable, push_failures, push_warnings};

impl Outputable for MigrateResult {
    fn to_table(&self) -> String {
        let mut out = if self.written.is_empty() {
            format!("{}\n{}", self.up, self.down.trim_end())
        } else {
            let mut lines = vec![format!(
                "Migration {} ({} tables): {}",
                self.version, self.compiled, self.description
            )];
            for path in &self.written {
                lines.push(format!("  wrote {}", path.display()));
            }
            lines.join("\n")
        };
        push_warnings(&mut out, &self.warnings);
        push_failures(&mut out, &self.failures);
        out
    }
}
