//! Output formatting for table command results.

use super::execute::TableResult;
use crate::output::{Outputable, push_warnings};

impl Outputable for TableResult {
    fn to_table(&self) -> String {
        let mut out = self.text.clone();
        push_warnings(&mut out, &self.warnings);
        out
    }
}
