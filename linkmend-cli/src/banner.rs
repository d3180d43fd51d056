//! End-of-run banner printed to stderr.

use linkmend_types::RunVerdict;
use owo_colors::OwoColorize;

const RULE: &str =
    "********************************************************************************";

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn message(verdict: RunVerdict) -> &'static str {
    match verdict {
        RunVerdict::Clean => "It looks like your model is fine!",
        RunVerdict::Fixed => {
            "The model was broken, but some automatic fixes have been applied.\n\
             Please verify that these changes are correct before pushing them.\n\
             Contact your tools team if you need further assistance."
        }
        RunVerdict::Broken => {
            "The model is broken, in a way we can't fix automatically!\n\
             Please contact your tools team to get assistance in repairing it."
        }
    }
}

pub fn render(verdict: RunVerdict, color: bool) -> String {
    let rule = if !color {
        RULE.to_string()
    } else {
        match verdict {
            RunVerdict::Clean => RULE.green().to_string(),
            RunVerdict::Fixed => RULE.yellow().to_string(),
            RunVerdict::Broken => RULE.red().to_string(),
        }
    };
    format!("\n{rule}\n\n{}\n\n{rule}", message(verdict))
}

pub fn print(verdict: RunVerdict) {
    eprintln!("{}", render(verdict, use_colors()));
}
