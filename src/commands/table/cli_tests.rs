//! CLI parsing tests for table command using the test DSL.

#[cfg(test)]
mod tests {
    use crate::schema::{Dialect, SqlFlavor};
    use crate::test_macros::parse_command;
    use rstest::rstest;

    crate::cli_missing_files_test! {
        command: "table",
        test_name: test_table_requires_file,
        placeholder: "<FILE>",
    }

    crate::cli_error_test! {
        command: "table",
        test_name: test_table_file_must_exist,
        args: ["definitely_missing.json"],
    }

    crate::cli_error_test! {
        command: "table",
        test_name: test_table_takes_one_file,
        args: ["Cargo.toml", "Cargo.toml"],
    }

    crate::cli_error_test! {
        command: "table",
        test_name: test_table_rejects_unknown_dialect,
        args: ["Cargo.toml", "-d", "mongo"],
    }

    crate::cli_defaults_test! {
        command: "table",
        variant: Table,
        files: ["Cargo.toml"],
        defaults: {
            entity: None,
            dialect: None,
            flavor: None,
        },
    }

    crate::cli_option_test! {
        command: "table",
        variant: Table,
        test_name: test_table_with_entity,
        files: ["Cargo.toml"],
        args: ["-e", "user"],
        field: entity,
        expected: Some("user".to_string()),
    }

    crate::cli_option_test! {
        command: "table",
        variant: Table,
        test_name: test_table_with_flavor,
        files: ["Cargo.toml"],
        args: ["--flavor", "mysql"],
        field: flavor,
        expected: Some(SqlFlavor::MySql),
    }

    #[rstest]
    #[case("sql", Dialect::Sql)]
    #[case("seaorm", Dialect::SeaOrm)]
    #[case("prisma", Dialect::Prisma)]
    #[case("document", Dialect::Document)]
    fn test_table_dialects(#[case] value: &str, #[case] expected: Dialect) {
        match parse_command("table", &["Cargo.toml", "--dialect", value]).unwrap() {
            crate::commands::Command::Table(cmd) => assert_eq!(cmd.dialect, Some(expected)),
            _ => panic!("Expected Table command"),
        }
    }

    #[rstest]
    fn test_global_format_after_subcommand() {
        use crate::cli::Args;
        use clap::Parser;
        let args = Args::try_parse_from(["schemagen", "table", "Cargo.toml", "-o", "json"]).unwrap();
        assert!(matches!(args.format, crate::output::OutputFormat::Json));
    }
}
