//! Output formatting for schema command results.

use crate::output::{Outputable, push_failures, push_warnings};
use crate::schema::SchemaOutcome;

impl Outputable for SchemaOutcome {
    fn to_table(&self) -> String {
        let mut out = self.text.trim_end().to_string();
        push_warnings(&mut out, &self.warnings);
        push_failures(&mut out, &self.failures);
        out
    }
}
