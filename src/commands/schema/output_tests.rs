//! Output formatting tests for schema command.

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::schema::{Dialect, EntityFailure, SchemaOutcome};
    use rstest::{fixture, rstest};

    const PARTIAL_TABLE: &str = "\
model user {
  id String @id
}

Failed (1):
  broken [DB_MISSING_PRIMARY_KEY]: Table 'broken' has no primary key";

    #[fixture]
    fn partial_outcome() -> SchemaOutcome {
        SchemaOutcome {
            dialect: Dialect::Prisma,
            text: "model user {\n  id String @id\n}\n".to_string(),
            warnings: vec![],
            failures: vec![EntityFailure::new(
                "broken",
                CompileError::MissingPrimaryKey {
                    table: "broken".to_string(),
                },
            )],
        }
    }

    crate::output_table_test! {
        test_name: test_to_table_reports_failures_after_text,
        fixture: partial_outcome,
        fixture_type: SchemaOutcome,
        expected: PARTIAL_TABLE,
    }

    #[rstest]
    fn test_format_json_skips_error_object(partial_outcome: SchemaOutcome) {
        use crate::output::{OutputFormat, Outputable};
        let parsed: serde_json::Value =
            serde_json::from_str(&partial_outcome.format(OutputFormat::Json)).unwrap();
        assert_eq!(parsed["dialect"], "prisma");
        let failure = &parsed["failures"][0];
        assert_eq!(failure["entity_id"], "broken");
        assert_eq!(failure["code"], "DB_MISSING_PRIMARY_KEY");
        assert!(failure.get("error").is_none());
    }

    crate::output_table_contains_test! {
        test_name: test_to_table_mentions_failed_entity,
        fixture: partial_outcome,
        fixture_type: SchemaOutcome,
        contains: ["model user {", "Failed (1):", "DB_MISSING_PRIMARY_KEY"],
    }

    crate::output_toon_test! {
        test_name: test_format_toon,
        fixture: partial_outcome,
        fixture_type: SchemaOutcome,
        contains: ["dialect: prisma", "failures[1]"],
    }
}
