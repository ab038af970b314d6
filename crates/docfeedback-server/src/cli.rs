//! Command line subcommands.

use docfeedback_docs::DeliveryMode;
use docfeedback_grade::{FeedbackRequest, Genre};

/// Parsed invocation.
#[derive(Debug, PartialEq)]
pub enum Command {
    Serve,
    Grade(GradeArgs),
    ExtractId(String),
    CheckAccess(String),
    Genres,
    Help,
}

#[derive(Debug, PartialEq)]
pub struct GradeArgs {
    pub reference: String,
    pub genre: Genre,
    pub mode: DeliveryMode,
    pub instructions: Option<String>,
}

impl GradeArgs {
    pub fn into_request(self) -> FeedbackRequest {
        let request = FeedbackRequest::new(self.reference, self.genre, self.mode);
        match self.instructions {
            Some(text) => request.with_instructions(text),
            None => request,
        }
    }
}

pub const USAGE: &str = "\
docfeedback - LLM rubric feedback for Google Docs

Usage: docfeedback [command]

Commands:
  (none)                          Start the server
  grade <url> [options]           Grade one document and print the report
      --genre <name|slug>         감상문, 비평문, 보고서, 소논문, 논설문 (default 감상문)
      --mode <inline|comment>     Delivery mode (default inline)
      --instructions <text>       Extra instructions for the grader
  check-access <url>              Show what the configured Google identity may do
  extract-id <url>                Print the document ID in a Docs URL
  genres                          List genres
  help                            Show this help message";

/// Parse `args` (without the program name).
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(command) = args.first() else {
        return Ok(Command::Serve);
    };

    match command.as_str() {
        "grade" => parse_grade(&args[1..]).map(Command::Grade),
        "extract-id" => args
            .get(1)
            .cloned()
            .map(Command::ExtractId)
            .ok_or_else(|| "Usage: docfeedback extract-id <url>".to_string()),
        "check-access" => args
            .get(1)
            .cloned()
            .map(Command::CheckAccess)
            .ok_or_else(|| "Usage: docfeedback check-access <url>".to_string()),
        "genres" => Ok(Command::Genres),
        "--help" | "-h" | "help" => Ok(Command::Help),
        other => Err(format!(
            "Unknown command: {}. Use 'docfeedback help' for usage.",
            other
        )),
    }
}

fn parse_grade(args: &[String]) -> Result<GradeArgs, String> {
    let mut reference = None;
    let mut genre = Genre::default();
    let mut mode = DeliveryMode::default();
    let mut instructions = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--genre" => {
                genre = value("--genre")?
                    .parse::<Genre>()
                    .map_err(|e| e.to_string())?
            }
            "--mode" => mode = value("--mode")?.parse()?,
            "--instructions" => instructions = Some(value("--instructions")?),
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ if reference.is_none() => reference = Some(arg.clone()),
            extra => return Err(format!("Unexpected argument: {}", extra)),
        }
    }

    Ok(GradeArgs {
        reference: reference.ok_or_else(|| "Usage: docfeedback grade <url> [options]".to_string())?,
        genre,
        mode,
        instructions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_serves() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Serve);
    }

    #[test]
    fn test_grade_with_options() {
        let cmd = parse_args(&args(&[
            "grade",
            "https://docs.google.com/document/d/ABC123/edit",
            "--genre",
            "논설문",
            "--mode",
            "comment",
            "--instructions",
            "서론을 중점적으로",
        ]))
        .unwrap();

        let Command::Grade(grade) = cmd else {
            panic!("expected grade, got {:?}", cmd);
        };
        assert_eq!(grade.genre, Genre::Argumentative);
        assert_eq!(grade.mode, DeliveryMode::Comment);

        let request = grade.into_request();
        assert_eq!(request.custom_instructions.as_deref(), Some("서론을 중점적으로"));
    }

    #[test]
    fn test_grade_defaults() {
        let Command::Grade(grade) = parse_args(&args(&["grade", "ABC123"])).unwrap() else {
            panic!("expected grade");
        };
        assert_eq!(grade.genre, Genre::Reflection);
        assert_eq!(grade.mode, DeliveryMode::Inline);
        assert!(grade.instructions.is_none());
    }

    #[test]
    fn test_bad_invocations() {
        assert!(parse_args(&args(&["grade"])).is_err());
        assert!(parse_args(&args(&["grade", "ABC", "--genre"])).is_err());
        assert!(parse_args(&args(&["grade", "ABC", "--genre", "시"])).is_err());
        assert!(parse_args(&args(&["grade", "ABC", "--mode", "email"])).is_err());
        assert!(parse_args(&args(&["grade", "ABC", "--verbose"])).is_err());
        assert!(parse_args(&args(&["extract-id"])).is_err());
        assert!(parse_args(&args(&["check-access"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(
            parse_args(&args(&["extract-id", "https://docs.google.com/document/d/X1/edit"])).unwrap(),
            Command::ExtractId("https://docs.google.com/document/d/X1/edit".into())
        );
        assert_eq!(
            parse_args(&args(&["check-access", "ABC123"])).unwrap(),
            Command::CheckAccess("ABC123".into())
        );
        assert_eq!(parse_args(&args(&["genres"])).unwrap(), Command::Genres);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }
}
