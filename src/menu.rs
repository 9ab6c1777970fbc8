//! Interactive host selection.
//!
//! Parsing is kept separate from the prompt loop so it can be tested
//! without a terminal.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Predefined,
    Custom,
    Quick,
}

pub fn parse_menu_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Predefined),
        "2" => Some(MenuChoice::Custom),
        "3" => Some(MenuChoice::Quick),
        _ => None,
    }
}

/// Resolves `a` or comma-separated 1-based indices into `predefined`.
/// Returns `None` if any index is out of range or not a number.
pub fn parse_index_selection(input: &str, predefined: &[String]) -> Option<Vec<String>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("a") {
        return Some(predefined.to_vec());
    }

    let mut selected = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let index: usize = token.parse().ok()?;
        let host = predefined.get(index.checked_sub(1)?)?;
        if !selected.contains(host) {
            selected.push(host.clone());
        }
    }
    (!selected.is_empty()).then_some(selected)
}

/// Splits comma-separated hosts, dropping blanks and duplicates.
pub fn parse_custom_hosts(input: &str) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for host in input.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        if !hosts.iter().any(|h| h == host) {
            hosts.push(host.to_string());
        }
    }
    hosts
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line)
}

/// Runs the menu on the given streams and returns the hosts to test.
///
/// Invalid choices fall back to `config.default_hosts`.
pub fn prompt_hosts<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    config: &AppConfig,
) -> io::Result<Vec<String>> {
    writeln!(output, "Select hosts to test:")?;
    writeln!(output, "  1) Predefined host list")?;
    writeln!(output, "  2) Enter custom hosts")?;
    writeln!(output, "  3) Quick test ({})", config.quick_hosts.join(", "))?;
    write!(output, "Choice [1-3]: ")?;
    output.flush()?;

    let choice = parse_menu_choice(&read_line(input)?);
    debug!("menu choice: {choice:?}");

    let hosts = match choice {
        Some(MenuChoice::Predefined) => {
            writeln!(output)?;
            for (i, host) in config.predefined_hosts.iter().enumerate() {
                writeln!(output, "  {:>2}) {host}", i + 1)?;
            }
            write!(output, "Hosts (e.g. 1,3,5 or 'a' for all): ")?;
            output.flush()?;
            parse_index_selection(&read_line(input)?, &config.predefined_hosts)
        }
        Some(MenuChoice::Custom) => {
            write!(output, "Hosts (comma-separated): ")?;
            output.flush()?;
            Some(parse_custom_hosts(&read_line(input)?)).filter(|h| !h.is_empty())
        }
        Some(MenuChoice::Quick) => Some(config.quick_hosts.clone()),
        None => None,
    };

    Ok(hosts.unwrap_or_else(|| {
        let _ = writeln!(
            output,
            "Invalid selection, using {}",
            config.default_hosts.join(", ")
        );
        config.default_hosts.clone()
    }))
}
