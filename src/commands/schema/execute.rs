use std::error::Error;

use super::SchemaCmd;
use crate::commands::Execute;
use crate::commands::input::read_all;
use crate::config::Config;
use crate::schema::{SchemaOutcome, compile_schema};

impl Execute for SchemaCmd {
    type Output = SchemaOutcome;

    fn execute(self, config: &Config) -> Result<Self::Output, Box<dyn Error>> {
        let loaded = read_all(&self.files)?;
        let dialect = config.dialect_or(self.dialect);
        let options = config.options_or(self.flavor);

        let mut outcome = compile_schema(&loaded.entities, dialect, &options);
        let mut failures = loaded.failures;
        failures.append(&mut outcome.failures);
        outcome.failures = failures;
        Ok(outcome)
    }
}
