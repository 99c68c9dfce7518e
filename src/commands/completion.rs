use crate::cli::Cli;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

fn parse_shell(shell: Option<&str>) -> Shell {
    match shell {
        Some("bash") => Shell::Bash,
        Some("zsh") => Shell::Zsh,
        Some("fish") => Shell::Fish,
        Some("powershell") | Some("pwsh") => Shell::PowerShell,
        Some("elvish") => Shell::Elvish,
        // 未指定时默认为 bash
        _ => Shell::Bash,
    }
}

pub fn cmd_generate_completion(shell: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(parse_shell(shell.as_deref()), &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell() {
        assert_eq!(parse_shell(Some("zsh")), Shell::Zsh);
        assert_eq!(parse_shell(Some("pwsh")), Shell::PowerShell);
        assert_eq!(parse_shell(None), Shell::Bash);
    }

    #[test]
    fn test_completion_mentions_subcommands() {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        generate(Shell::Bash, &mut cmd, "ssh-key-manager", &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("delete-all"));
        assert!(script.contains("show-registry"));
    }
}
