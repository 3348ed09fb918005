//! Execute tests for migrate command.

#[cfg(test)]
mod tests {
    use std::fs;

    use super::super::MigrateCmd;
    use crate::commands::Execute;
    use crate::config::Config;
    use crate::schema::SqlFlavor;
    use crate::test_utils::{
        BLOG_JSON, BROKEN_JSON, SIDEWAYS_JSON, USER_JSON, create_temp_json_file, execute_cmd,
    };
    use rstest::rstest;

    // =========================================================================
    // Core functionality tests
    // =========================================================================

    crate::execute_file_test! {
        test_name: test_blog_migration,
        json: BLOG_JSON,
        cmd: |path| MigrateCmd { files: vec![path], version: Some("2024_06_01".to_string()), flavor: None, out_dir: None },
        check: |result| {
            assert_eq!(result.compiled, 3);
            assert_eq!(result.description, "create user, post, tag");
            assert!(result.up.starts_with("-- Migration 2024_06_01: create user, post, tag\n-- Generated at "));
            assert!(result.up.contains("-- post (2024_06_01): indexes\nCREATE INDEX idx_post_title ON post (title);"));
            assert!(result.up.contains("CREATE TABLE post_tags ("));
            assert!(result.down.contains("DROP TABLE IF EXISTS tag CASCADE;"));
            assert!(result.written.is_empty());
        },
    }

    crate::execute_file_test! {
        test_name: test_default_version_and_mysql,
        json: USER_JSON,
        cmd: |path| MigrateCmd { files: vec![path], version: None, flavor: Some(SqlFlavor::MySql), out_dir: None },
        check: |result| {
            assert_eq!(result.version, "v1");
            assert!(result.up.contains("id CHAR(36) NOT NULL DEFAULT (UUID())"));
        },
    }

    // =========================================================================
    // Partial failure tests
    // =========================================================================

    #[rstest]
    fn test_failures_are_reported_and_skipped() {
        let good = create_temp_json_file(USER_JSON);
        let bad = create_temp_json_file(BROKEN_JSON);
        let cmd = MigrateCmd {
            files: vec![good.path().to_path_buf(), bad.path().to_path_buf()],
            version: None,
            flavor: None,
            out_dir: None,
        };
        let result = execute_cmd(cmd).unwrap();
        assert_eq!(result.compiled, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(!result.down.contains("broken"));
    }

    crate::execute_file_test! {
        test_name: test_unparseable_entity_does_not_abort_the_batch,
        json: SIDEWAYS_JSON,
        cmd: |path| MigrateCmd { files: vec![path], version: None, flavor: None, out_dir: None },
        check: |result| {
            assert_eq!(result.compiled, 2);
            assert_eq!(result.description, "create user, tag");
            assert_eq!(result.failures.len(), 1);
            assert_eq!(result.failures[0].entity_id, "post");
            assert!(result.failures[0].message.contains("Unknown relation type 'sideways'"));
            assert!(!result.up.contains("CREATE TABLE post"));
        },
    }

    // =========================================================================
    // Output file and config tests
    // =========================================================================

    #[rstest]
    fn test_out_dir_receives_scripts() {
        let file = create_temp_json_file(USER_JSON);
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("migrations");
        let cmd = MigrateCmd {
            files: vec![file.path().to_path_buf()],
            version: Some("v7".to_string()),
            flavor: None,
            out_dir: Some(out.clone()),
        };
        let result = execute_cmd(cmd).unwrap();
        assert_eq!(result.written, vec![out.join("v7_up.sql"), out.join("v7_down.sql")]);
        let up = fs::read_to_string(out.join("v7_up.sql")).unwrap();
        assert_eq!(up, result.up);
        let down = fs::read_to_string(out.join("v7_down.sql")).unwrap();
        assert!(down.starts_with("-- Rollback v7: create user\n"));
    }

    #[rstest]
    fn test_config_version_applies() {
        let file = create_temp_json_file(USER_JSON);
        let config = Config {
            version: Some("from_config".to_string()),
            ..Default::default()
        };
        let cmd = MigrateCmd {
            files: vec![file.path().to_path_buf()],
            version: None,
            flavor: None,
            out_dir: None,
        };
        let result = cmd.execute(&config).unwrap();
        assert_eq!(result.version, "from_config");
    }
}
