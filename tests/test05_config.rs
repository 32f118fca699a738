use std::io::Write;
use std::time::Duration;

use sql_proc_mapper::config::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT};
use sql_proc_mapper::{ConnectionConfig, ConnectionStrings, MapperOptions, ProcMapperError};

#[test]
fn named_connection_strings_load_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "connectionStrings": {{
                "miconexion": "Server=tcp:db,1433;Database=hr;User Id=app;Password=s3cret",
                "reporting": "Server=tcp:reports,1433;Database=dw;Integrated Security=true"
            }}
        }}"#
    )?;

    let strings = ConnectionStrings::from_file(file.path())?;
    let cfg = strings.get("miconexion")?;
    assert_eq!(
        cfg.connection_string(),
        "Server=tcp:db,1433;Database=hr;User Id=app;Password=s3cret"
    );
    assert_eq!(cfg.property("Server"), Some("tcp:db,1433"));

    let mut names: Vec<&str> = strings.names().collect();
    names.sort_unstable();
    assert_eq!(names, ["miconexion", "reporting"]);

    assert!(matches!(
        strings.get("missing"),
        Err(ProcMapperError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn unreadable_settings_are_config_errors() {
    assert!(matches!(
        ConnectionStrings::from_file("/definitely/not/here.json"),
        Err(ProcMapperError::ConfigError(_))
    ));
    assert!(matches!(
        ConnectionStrings::from_json("{ not json"),
        Err(ProcMapperError::ConfigError(_))
    ));
}

#[test]
fn connection_string_from_environment() {
    let var = "SQL_PROC_MAPPER_TEST_CONFIG_MISSING_VAR";
    assert!(matches!(
        ConnectionConfig::from_env(var),
        Err(ProcMapperError::ConfigError(_))
    ));
}

#[test]
fn mapper_options_defaults_and_builder() {
    let defaults = MapperOptions::default();
    assert_eq!(defaults.command_timeout, DEFAULT_COMMAND_TIMEOUT);
    assert_eq!(defaults.command_timeout, Duration::from_secs(300));
    assert_eq!(defaults.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    assert!(defaults.bind_status_parameters);

    let opts = MapperOptions::builder()
        .command_timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(2))
        .bind_status_parameters(false)
        .finish();
    assert_eq!(opts.command_timeout, Duration::from_secs(30));
    assert_eq!(opts.connect_timeout, Duration::from_secs(2));
    assert!(!opts.bind_status_parameters);
}
