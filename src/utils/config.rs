#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::{env, fs, path::Path, time::Duration};
use fs_mistrust::Mistrust;
use std::os::unix::fs::PermissionsExt;
use lazy_static::lazy_static;
use structopt::StructOpt;

use crate::utils::{demo_utils, errors::Errors};

use super::demo_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_ROOT_DIR         : &str = "USER_DEMO_ROOT_DIR";
const DEFAULT_ROOT_DIR     : &str = "~/.user_demo";
const CONFIG_DIR           : &str = "/config";
const LOGS_DIR             : &str = "/logs";
const CERTS_DIR            : &str = "/certs";
const LOG4RS_CONFIG_FILE   : &str = "/log4rs.yml";     // relative to config dir
const SERVER_CONFIG_FILE   : &str = "/user_demo.toml"; // relative to config dir
const DEFAULT_LOG_FILE     : &str = "/user_demo.log";  // relative to logs dir
pub const TLS_KEY_FILE     : &str = "/key.pem";        // relative to certs dir
pub const TLS_CERT_FILE    : &str = "/cert.pem";       // relative to certs dir

// Networking.
const DEFAULT_HTTP_ADDR    : &str = "http://localhost";
const DEFAULT_HTTP_PORT    : u16  = 3000;

// Artificial latency added to the user list endpoint.
const DEFAULT_LIST_DELAY_MS: u64  = 100;

// Patterns used when no log4rs file is installed.
const DEFAULT_LOG_PATTERN  : &str = "{d(%Y-%m-%dT%H:%M:%S%.3fZ)(utc)} {h({l})} {t} - {m}{n}";
const DEFAULT_FILE_PATTERN : &str = "{d(%Y-%m-%dT%H:%M:%S%.3fZ)(utc)} {l} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE the runtime context is initialized in main.
lazy_static! {
    pub static ref SERVER_ARGS: ServerArgs = init_server_args();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// DemoDirs:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct DemoDirs {
    pub root_dir: String,
    pub config_dir: String,
    pub logs_dir: String,
    pub certs_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// ServerArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "user_demo_args", about = "Command line arguments for the user demo server.")]
pub struct ServerArgs {
    /// Specify the server's root data directory.
    ///
    /// This directory contains the configuration, log and certificate
    /// directories the server uses during execution.
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Create the data directories and then exit.
    ///
    /// The data directories will be rooted at a root directory calculated
    /// using the following priority order:
    ///
    ///   1. If set, the value of the USER_DEMO_ROOT_DIR environment,
    ///
    ///   2. Otherwise, if set, the value of the --root-dir command line argument,
    ///
    ///   3. Otherwise, ~/.user_demo
    ///
    #[structopt(short, long)]
    pub create_dirs_only: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
// The config file is None when defaults are in effect.
#[derive(Debug)]
pub struct Parms {
    pub config_file: Option<String>,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub dirs: DemoDirs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub list_delay_ms: u64,
    pub enable_tls: bool,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn list_delay(&self) -> Duration {
        Duration::from_millis(self.list_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "User Demo Server".to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            list_delay_ms: DEFAULT_LIST_DELAY_MS,
            enable_tls: false,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_server_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_server_args() -> ServerArgs {
    let args = ServerArgs::from_args();
    println!("{:?}", args);
    args
}

// ---------------------------------------------------------------------------
// init_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories, creating the ones that don't
 * exist yet.
 */
pub fn init_dirs() -> Result<DemoDirs> {
    // Initialize the mistrust object.
    let mistrust = get_mistrust()?;

    // Check that each path is absolute and is a directory with the
    // proper permission assign if it exists.  If it doesn't exist,
    // create it.
    let root_dir = get_root_dir();
    check_dir(&root_dir, "root directory", &mistrust)?;

    let config_dir = root_dir.clone() + CONFIG_DIR;
    check_dir(&config_dir, "config directory", &mistrust)?;

    let logs_dir = root_dir.clone() + LOGS_DIR;
    check_dir(&logs_dir, "logs directory", &mistrust)?;

    let certs_dir = root_dir.clone() + CERTS_DIR;
    check_dir(&certs_dir, "certs directory", &mistrust)?;

    Ok(DemoDirs {root_dir, config_dir, logs_dir, certs_dir})
}

// ---------------------------------------------------------------------------
// check_dir:
// ---------------------------------------------------------------------------
/** Check that the path is absolute and, if it exists, that is has the proper
 * permissions assigned.  If it doesn't exist, create it.  The mistrust package
 * creates directories with 0o700 permissions.
 */
fn check_dir(dir: &str, msgname: &str, mistrust: &Mistrust) -> Result<()> {
    let path = Path::new(dir);
    if !path.is_absolute() {
        return Err(anyhow!(Errors::DataDirectory(format!("the {} path must be absolute: {}", msgname, dir))));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(anyhow!(Errors::DataDirectory(format!("the {} path must be a directory: {}", msgname, dir))));
        }

        // Owner-only rwx.
        let perm = path.metadata()?.permissions().mode();
        if perm & 0o777 != 0o700 {
            return Err(anyhow!(Errors::DataDirectory(format!("the {} path must have 0o700 permissions: {}", msgname, dir))));
        }
    } else {
        mistrust.make_directory(path)
            .map_err(|e| anyhow!(Errors::DataDirectory(format!("make directory error for {}: {}", dir, e))))?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// get_mistrust:
// ---------------------------------------------------------------------------
/** Configure a new mistrust object for initial directory processing. */
fn get_mistrust() -> Result<Mistrust> {
    Mistrust::builder()
        .ignore_prefix(get_absolute_path("~"))
        .trust_group(0)
        .build()
        .map_err(|e| anyhow!("Mistrust configuration error: {}", e))
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir() -> String {
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line --root-dir argument
    //  3. Default location
    //
    let root_dir = env::var(ENV_ROOT_DIR).unwrap_or_else(
        |_| {
            match SERVER_ARGS.root_dir.clone() {
                Some(r) => r,
                None => DEFAULT_ROOT_DIR.to_string(),
            }
        });

    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from the configuration directory's log4rs.yml.  When
 * that file is not installed, log at info level to the console and to
 * user_demo.log in the logs directory.
 */
pub fn init_log(dirs: &DemoDirs) -> Result<()> {
    let logconfig = dirs.config_dir.clone() + LOG4RS_CONFIG_FILE;
    if Path::new(&logconfig).exists() {
        log4rs::init_file(&logconfig, Default::default()).map_err(|e| {
            println!("{}", e);
            anyhow!(Errors::Log4rsInitialization(logconfig.clone()))
        })?;
        info!("Log4rs initialized using: {}", logconfig);
    } else {
        let logfile = get_default_log_file(dirs);
        log4rs::init_config(default_log_config(&logfile)?)?;
        info!("Log4rs file {} not found, logging to the console and {}.", logconfig, logfile);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// get_default_log_file:
// ---------------------------------------------------------------------------
fn get_default_log_file(dirs: &DemoDirs) -> String {
    dirs.logs_dir.clone() + DEFAULT_LOG_FILE
}

// ---------------------------------------------------------------------------
// default_log_config:
// ---------------------------------------------------------------------------
/** Build the fallback configuration: console plus an appending log file.
 * The file is opened (and created if needed) here.
 */
fn default_log_config(logfile: &str) -> Result<LogConfig> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_FILE_PATTERN)))
        .append(true)
        .build(logfile)
        .map_err(|e| anyhow!("unable to open log file {}: {}", logfile, e))?;

    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(Root::builder().appender("stdout").appender("file").build(LevelFilter::Info))?;
    Ok(config)
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config directory.  A missing file means all defaults; a file that doesn't
 * parse is an error.
 */
fn get_parms(dirs: &DemoDirs) -> Result<Parms> {
    let config_file = dirs.config_dir.clone() + SERVER_CONFIG_FILE;
    let config_file_abs = demo_utils::get_absolute_path(&config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            info!("Unable to read configuration at {}. Using default values.", config_file_abs);
            return Ok(Parms { config_file: None, config: Config::new() });
        }
    };

    let config = parse_config(&contents, &config_file_abs)?;
    Ok(Parms { config_file: Some(config_file_abs), config })
}

// ---------------------------------------------------------------------------
// parse_config:
// ---------------------------------------------------------------------------
fn parse_config(contents: &str, config_file: &str) -> Result<Config> {
    match toml::from_str(contents) {
        Ok(c) => Ok(c),
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file.to_string()), e);
            error!("{}", msg);
            Err(anyhow!(msg))
        }
    }
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
/** Read the configuration file now that the directories exist and logging
 * is up.
 */
pub fn init_runtime_context(dirs: DemoDirs) -> Result<RuntimeCtx> {
    let parms = get_parms(&dirs)?;
    Ok(RuntimeCtx {parms, dirs})
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dirs(name: &str) -> DemoDirs {
        let root = env::temp_dir().join(format!("user_demo_{}_{}", name, std::process::id()));
        let root_dir = root.to_string_lossy().to_string();
        fs::create_dir_all(&root).unwrap();
        DemoDirs {
            config_dir: root_dir.clone() + CONFIG_DIR,
            logs_dir: root_dir.clone() + LOGS_DIR,
            certs_dir: root_dir.clone() + CERTS_DIR,
            root_dir,
        }
    }

    #[test]
    fn fallback_log_file_lives_in_logs_dir() {
        let dirs = scratch_dirs("log");
        fs::create_dir_all(&dirs.logs_dir).unwrap();
        let logfile = get_default_log_file(&dirs);
        assert_eq!(logfile, dirs.logs_dir.clone() + "/user_demo.log");

        let config = default_log_config(&logfile).unwrap();
        assert_eq!(config.appenders().len(), 2);
        assert!(Path::new(&logfile).is_file());
        fs::remove_dir_all(&dirs.root_dir).unwrap();
    }

    #[test]
    fn config_file_is_recorded_only_when_read() {
        let dirs = scratch_dirs("parms");
        fs::create_dir_all(&dirs.config_dir).unwrap();
        let parms = get_parms(&dirs).unwrap();
        assert_eq!(parms.config_file, None);
        assert_eq!(parms.config, Config::new());

        let config_file = dirs.config_dir.clone() + SERVER_CONFIG_FILE;
        fs::write(&config_file, "http_port = 8081\n").unwrap();
        let parms = get_parms(&dirs).unwrap();
        assert_eq!(parms.config_file, Some(config_file));
        assert_eq!(parms.config.http_port, 8081);
        fs::remove_dir_all(&dirs.root_dir).unwrap();
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::new();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.list_delay(), Duration::from_millis(100));
        assert!(!config.enable_tls);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = parse_config("http_port = 8080\nlist_delay_ms = 0\n", "test.toml").unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.list_delay_ms, 0);
        assert_eq!(config.title, Config::new().title);
        assert_eq!(config.http_addr, DEFAULT_HTTP_ADDR);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let err = parse_config("http_port = \"not a port\"", "bad.toml").unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }
}
