//! Platform command table
//!
//! Each platform is one row: how to launch the daemon, which commands clear
//! out a stale daemon (and whatever holds its port), and how long to let
//! the OS settle afterwards. `{port}` is substituted at lookup time.

use std::fmt;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Run through `sh -c` / `cmd /C` (needed for pipes)
    pub shell: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            shell: false,
        }
    }

    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            program: line.into(),
            args: Vec::new(),
            shell: true,
        }
    }

    pub fn to_command(&self) -> Command {
        if self.shell {
            return shell_command(&self.to_string());
        }

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn fill(&self, key: &str, value: &str) -> Self {
        let fill = |s: &str| s.replace(key, value);
        Self {
            program: fill(self.program.as_str()),
            args: self.args.iter().map(|a| fill(a.as_str())).collect(),
            shell: self.shell,
        }
    }

    /// A shell spec without args is a complete command line, not a path
    fn is_bare_line(&self) -> bool {
        self.shell && self.args.is_empty()
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

/// std's argument quoting escapes `"` as `\"`, which cmd does not understand
#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.raw_arg(cmd_arguments(line));
    command
}

/// With `/S` cmd strips exactly the outer quote pair and runs the rest as is
#[cfg(any(windows, test))]
fn cmd_arguments(line: &str) -> String {
    format!("/S /C \"{}\"", line)
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.program.contains(' ') && !self.is_bare_line() {
            write!(f, "\"{}\"", self.program)?;
        } else {
            f.write_str(&self.program)?;
        }
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub platform: Platform,
    pub launch: CommandSpec,
    /// Run in order, each best-effort
    pub termination: Vec<CommandSpec>,
    pub settle_delay: Duration,
}

struct ProfileRow {
    platform: Platform,
    launch: (&'static str, &'static [&'static str], bool),
    termination: &'static [(&'static str, &'static [&'static str], bool)],
    settle_ms: u64,
}

const PROFILES: &[ProfileRow] = &[
    ProfileRow {
        platform: Platform::MacOs,
        launch: ("/Applications/Ollama.app/Contents/Resources/ollama", &["serve"], false),
        termination: &[
            ("pkill", &["-f", "Ollama.app"], false),
            ("pkill", &["-f", "ollama serve"], false),
            ("lsof -ti:{port} | xargs kill -9", &[], true),
        ],
        settle_ms: 5_000,
    },
    ProfileRow {
        platform: Platform::Windows,
        launch: ("ollama", &["serve"], true),
        termination: &[
            ("taskkill", &["/F", "/IM", "ollama.exe"], false),
            (
                "for /f \"tokens=5\" %a in ('netstat -aon ^| findstr :{port}') do taskkill /F /PID %a",
                &[],
                true,
            ),
        ],
        settle_ms: 8_000,
    },
    ProfileRow {
        platform: Platform::Linux,
        launch: ("ollama", &["serve"], false),
        termination: &[
            ("pkill", &["-f", "ollama serve"], false),
            ("fuser", &["-k", "{port}/tcp"], false),
        ],
        settle_ms: 3_000,
    },
];

fn spec_from((program, args, shell): (&str, &[&str], bool)) -> CommandSpec {
    CommandSpec {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        shell,
    }
}

impl PlatformProfile {
    pub fn for_platform(platform: Platform, port: u16) -> Self {
        let port = port.to_string();
        let row = PROFILES
            .iter()
            .find(|row| row.platform == platform)
            .unwrap_or(&PROFILES[PROFILES.len() - 1]);

        Self {
            platform,
            launch: spec_from(row.launch).fill("{port}", &port),
            termination: row
                .termination
                .iter()
                .map(|step| spec_from(*step).fill("{port}", &port))
                .collect(),
            settle_delay: Duration::from_millis(row.settle_ms),
        }
    }

    pub fn current(port: u16) -> Self {
        Self::for_platform(Platform::current(), port)
    }

    /// Replace the daemon executable, keeping the launch arguments
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.launch.program = executable.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_has_a_row() {
        for platform in [Platform::MacOs, Platform::Windows, Platform::Linux] {
            let profile = PlatformProfile::for_platform(platform, 11434);
            assert_eq!(profile.platform, platform);
            assert_eq!(profile.launch.args.last().map(String::as_str), Some("serve"));
            assert!(!profile.termination.is_empty());
        }
    }

    #[test]
    fn test_port_is_substituted() {
        let mac = PlatformProfile::for_platform(Platform::MacOs, 12345);
        assert_eq!(mac.termination[2].to_string(), "lsof -ti:12345 | xargs kill -9");

        let linux = PlatformProfile::for_platform(Platform::Linux, 12345);
        assert_eq!(linux.termination[1].args, vec!["-k", "12345/tcp"]);

        let windows = PlatformProfile::for_platform(Platform::Windows, 12345);
        assert!(windows.termination[1].program.contains("findstr :12345"));
    }

    #[test]
    fn test_settle_delays() {
        let mac = PlatformProfile::for_platform(Platform::MacOs, 11434);
        let windows = PlatformProfile::for_platform(Platform::Windows, 11434);
        let linux = PlatformProfile::for_platform(Platform::Linux, 11434);

        assert!(windows.settle_delay > mac.settle_delay);
        assert!(mac.settle_delay > linux.settle_delay);
    }

    #[test]
    fn test_launch_commands() {
        let mac = PlatformProfile::for_platform(Platform::MacOs, 11434);
        assert_eq!(
            mac.launch.to_string(),
            "/Applications/Ollama.app/Contents/Resources/ollama serve"
        );

        let windows = PlatformProfile::for_platform(Platform::Windows, 11434);
        assert!(windows.launch.shell);
        assert_eq!(windows.launch.to_string(), "ollama serve");
    }

    #[test]
    fn test_executable_override() {
        let profile =
            PlatformProfile::for_platform(Platform::Linux, 11434).with_executable("/opt/ollama");
        assert_eq!(profile.launch.to_string(), "/opt/ollama serve");
    }

    #[test]
    fn test_display_quotes_spaced_args() {
        let spec = CommandSpec::new("pkill", ["-f", "ollama serve"]);
        assert_eq!(spec.to_string(), "pkill -f \"ollama serve\"");
    }

    #[test]
    fn test_spaced_executable_is_quoted_for_the_shell() {
        let windows = PlatformProfile::for_platform(Platform::Windows, 11434)
            .with_executable("C:\\Program Files\\Ollama\\ollama.exe");
        assert_eq!(
            windows.launch.to_string(),
            "\"C:\\Program Files\\Ollama\\ollama.exe\" serve"
        );

        // a whole shell line is never wrapped
        let line = CommandSpec::shell("lsof -ti:1 | xargs kill -9");
        assert_eq!(line.to_string(), "lsof -ti:1 | xargs kill -9");
    }

    #[test]
    fn test_cmd_arguments_keep_inner_quotes() {
        let windows = PlatformProfile::for_platform(Platform::Windows, 11434);
        assert_eq!(
            cmd_arguments(&windows.termination[1].to_string()),
            "/S /C \"for /f \"tokens=5\" %a in ('netstat -aon ^| findstr :11434') do taskkill /F /PID %a\""
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_line_reaches_sh_intact() {
        let status = CommandSpec::shell("for x in \"a b\"; do test \"$x\" = \"a b\"; done")
            .to_command()
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }

    #[cfg(windows)]
    #[tokio::test]
    async fn test_for_loop_reaches_cmd_intact() {
        let output = CommandSpec::shell("for /f \"tokens=2\" %a in ('echo hello world') do @echo %a")
            .to_command()
            .output()
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "world");
    }
}
