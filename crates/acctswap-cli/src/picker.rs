//! Numbered terminal prompt

use std::io::{self, BufRead, Write};

use acctswap_core::{AccountId, AccountSummary, Picker};

use crate::render;

/// Prompts on stdout and reads the choice from stdin
pub struct StdinPicker;

impl Picker for StdinPicker {
    fn pick(&self, prompt: &str, accounts: &[AccountSummary]) -> io::Result<Option<AccountId>> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        prompt_choice(&mut stdin.lock(), &mut stdout.lock(), prompt, accounts)
    }
}

/// Ask until the user enters a valid position. Empty input, `q` or EOF cancel.
pub fn prompt_choice(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    accounts: &[AccountSummary],
) -> io::Result<Option<AccountId>> {
    writeln!(output, "{prompt}")?;
    for account in accounts {
        writeln!(output, "  {}", render::summary_line(account))?;
    }

    loop {
        write!(output, "Enter a number (empty or q to cancel): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }
        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        let chosen = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| accounts.get(index));
        match chosen {
            Some(account) => return Ok(Some(account.id)),
            None => writeln!(output, "Not a valid choice: {answer}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Cursor;

    fn accounts() -> Vec<AccountSummary> {
        [(1, "a@b.com"), (3, "c@d.com")]
            .into_iter()
            .enumerate()
            .map(|(index, (id, email))| AccountSummary {
                id,
                position: index + 1,
                label: format!("Account-{}", index + 1),
                email: email.to_string(),
                alias: None,
                added_at: Utc::now(),
                active: index == 0,
            })
            .collect()
    }

    fn run(input: &str) -> (Option<AccountId>, String) {
        let mut output = Vec::new();
        let choice =
            prompt_choice(&mut Cursor::new(input), &mut output, "Pick:", &accounts()).unwrap();
        (choice, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_position_maps_to_id() {
        let (choice, output) = run("2\n");
        assert_eq!(choice, Some(3));
        assert!(output.starts_with("Pick:\n"));
        assert!(output.contains("c@d.com"));
    }

    #[test]
    fn test_cancel_inputs() {
        for input in ["\n", "q\n", "Q\n", ""] {
            assert_eq!(run(input).0, None, "input {input:?}");
        }
    }

    #[test]
    fn test_invalid_then_valid() {
        let (choice, output) = run("0\nfoo\n9\n1\n");
        assert_eq!(choice, Some(1));
        assert_eq!(output.matches("Not a valid choice").count(), 3);
    }
}
