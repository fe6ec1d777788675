//! Command-Line Argument Decoding
//!
//! Positional arguments arrive as literal strings written by the job
//! wrapper. Lists and maps are JSON, or Python-style literals with single
//! quotes, `True`/`False`/`None` and bare integer keys.

use std::path::PathBuf;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::job::{InputFileDescriptor, JobMask, Seeding};
use super::tweak::PsetTweak;
use super::TweakError;
use crate::workflow::LumiMask;

/// Names of the positional arguments, in order.
pub const POSITIONAL_NAMES: [&str; 10] = [
    "MODE",
    "LOCATION",
    "INPUT_FILES",
    "RUN_AND_LUMIS",
    "FIRST_EVENT",
    "LAST_EVENT",
    "FIRST_LUMI",
    "FIRST_RUN",
    "SEEDING",
    "LHE_INPUT",
];

const COMMON_ARGS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    MonteCarlo,
    Analysis,
}

impl JobMode {
    fn from_arg(arg: &str) -> Self {
        if arg == "MC" {
            Self::MonteCarlo
        } else {
            Self::Analysis
        }
    }
}

/// Decoded arguments of one job setup invocation.
#[derive(Debug, Clone)]
pub struct TweakArguments {
    pub mode: JobMode,
    pub location: PathBuf,
    pub input_files: Vec<InputFileDescriptor>,
    pub mask: JobMask,
    pub seeding: Option<Seeding>,
    pub lhe_input: bool,
}

impl TweakArguments {
    /// Builds the tweak for these arguments and the given output modules.
    pub fn to_tweak(&self, output_modules: Vec<String>) -> PsetTweak {
        PsetTweak::new(output_modules)
            .with_lhe_input(self.lhe_input)
            .with_seeding(self.seeding.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputFileArg {
    Lfn(String),
    Descriptor(InputFileDescriptor),
}

impl From<InputFileArg> for InputFileDescriptor {
    fn from(arg: InputFileArg) -> Self {
        match arg {
            InputFileArg::Lfn(lfn) => InputFileDescriptor::new(lfn),
            InputFileArg::Descriptor(descriptor) => descriptor,
        }
    }
}

/// Decodes the positional arguments (mode first, program name excluded).
pub fn decode_positional(args: &[String]) -> Result<TweakArguments, TweakError> {
    if args.len() < COMMON_ARGS {
        return Err(TweakError::MissingArgument(POSITIONAL_NAMES[args.len()]));
    }

    let mode = JobMode::from_arg(&args[0]);
    let expected = match mode {
        JobMode::MonteCarlo => POSITIONAL_NAMES.len(),
        JobMode::Analysis => COMMON_ARGS,
    };

    if args.len() < expected {
        return Err(TweakError::MissingArgument(POSITIONAL_NAMES[args.len()]));
    }
    if args.len() > expected {
        return Err(TweakError::BadArgument {
            name: "arguments",
            value: args[expected..].join(" "),
            reason: format!("expected {} positional arguments", expected),
        });
    }

    let files: Vec<InputFileArg> = parse_literal("INPUT_FILES", &args[2])?;
    let run_and_lumis: LumiMask = parse_literal("RUN_AND_LUMIS", &args[3])?;

    let mut decoded = TweakArguments {
        mode,
        location: PathBuf::from(&args[1]),
        input_files: files.into_iter().map(InputFileDescriptor::from).collect(),
        mask: JobMask::new().with_run_and_lumis(run_and_lumis),
        seeding: None,
        lhe_input: false,
    };

    if mode == JobMode::MonteCarlo {
        decoded.mask.first_event = parse_optional_number("FIRST_EVENT", &args[4])?;
        decoded.mask.last_event = parse_optional_number("LAST_EVENT", &args[5])?;
        decoded.mask.first_lumi = Some(
            parse_optional_number("FIRST_LUMI", &args[6])?
                .ok_or(TweakError::MissingArgument("FIRST_LUMI"))?,
        );
        decoded.mask.first_run = parse_optional_number("FIRST_RUN", &args[7])?;
        decoded.seeding = parse_seeding(&args[8]);
        decoded.lhe_input = parse_flag("LHE_INPUT", &args[9])?;
    }

    debug!("Decoded arguments: {:?}", decoded);
    Ok(decoded)
}

/// Parses a literal as JSON, falling back to Python literal syntax.
pub fn parse_literal<T: DeserializeOwned>(name: &'static str, raw: &str) -> Result<T, TweakError> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&normalize_literal(raw)))
        .map_err(|e| TweakError::BadArgument {
            name,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Parses a number where `None` and negative values mean "not given".
fn parse_optional_number(name: &'static str, raw: &str) -> Result<Option<u64>, TweakError> {
    let trimmed = raw.trim();
    if matches!(trimmed, "" | "None" | "null") {
        return Ok(None);
    }

    let value: i64 = trimmed.parse().map_err(|e: std::num::ParseIntError| TweakError::BadArgument {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    Ok(u64::try_from(value).ok())
}

/// Parses a truth value: booleans, integers (non-zero is true) or `None`.
fn parse_flag(name: &'static str, raw: &str) -> Result<bool, TweakError> {
    match parse_literal::<serde_json::Value>(name, raw)? {
        serde_json::Value::Bool(flag) => Ok(flag),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Number(n) => Ok(n.as_f64().map_or(false, |v| v != 0.0)),
        other => Err(TweakError::BadArgument {
            name,
            value: raw.to_string(),
            reason: format!("expected a boolean or integer, got {}", other),
        }),
    }
}

fn parse_seeding(raw: &str) -> Option<Seeding> {
    match raw.trim() {
        "" | "None" | "null" => None,
        other => other.parse().ok(),
    }
}

/// Rewrites a Python literal into JSON.
fn normalize_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => out.push('\\'),
                        },
                        quote if quote == c => break,
                        '"' => out.push_str("\\\""),
                        other => out.push(other),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    _ => word.as_str(),
                });
            }
            c if c.is_ascii_digit() => {
                let mut number = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let mut gap = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() {
                        gap.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                // Integer map keys become string keys
                if chars.peek() == Some(&':') {
                    out.push('"');
                    out.push_str(&number);
                    out.push('"');
                } else {
                    out.push_str(&number);
                }
                out.push_str(&gap);
            }
            other => out.push(other),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_literal() {
        assert_eq!(normalize_literal("['a.root', 'b.root']"), r#"["a.root", "b.root"]"#);
        assert_eq!(normalize_literal("{1: [[2, 3]]}"), r#"{"1": [[2, 3]]}"#);
        assert_eq!(normalize_literal("[True, False, None]"), "[true, false, null]");
        assert_eq!(normalize_literal(r#"['say "hi"']"#), r#"["say \"hi\""]"#);
    }

    #[test]
    fn test_parse_literal_json_and_python() {
        let json: Vec<String> = parse_literal("INPUT_FILES", r#"["/store/a.root"]"#).unwrap();
        let python: Vec<String> = parse_literal("INPUT_FILES", "['/store/a.root']").unwrap();
        assert_eq!(json, python);

        let flag: bool = parse_literal("LHE_INPUT", "True").unwrap();
        assert!(flag);
    }

    #[test]
    fn test_parse_literal_invalid() {
        let result: Result<Vec<String>, _> = parse_literal("INPUT_FILES", "[unclosed");
        assert!(matches!(
            result,
            Err(TweakError::BadArgument { name: "INPUT_FILES", .. })
        ));
    }

    #[test]
    fn test_decode_analysis_mode() {
        let decoded = decode_positional(&args(&[
            "Analysis",
            "/tmp/job",
            "['/store/a.root', {'lfn': '/store/b.root', 'parents': ['/store/pb.root']}]",
            "{'1': [[669684, 669684]]}",
        ]))
        .unwrap();

        assert_eq!(decoded.mode, JobMode::Analysis);
        assert_eq!(decoded.location, PathBuf::from("/tmp/job"));
        assert_eq!(decoded.input_files.len(), 2);
        assert_eq!(decoded.input_files[1].parents, vec!["/store/pb.root"]);
        assert_eq!(
            decoded.mask.run_and_lumis.lumis_to_process(),
            vec!["1:669684-1:669684"]
        );
        assert_eq!(decoded.mask.first_event, None);
        assert!(decoded.seeding.is_none());
    }

    #[test]
    fn test_decode_mc_mode() {
        let decoded = decode_positional(&args(&[
            "MC",
            ".",
            "['MCFakeFile-1']",
            "{}",
            "1",
            "100",
            "3",
            "None",
            "AutomaticSeeding",
            "False",
        ]))
        .unwrap();

        assert_eq!(decoded.mode, JobMode::MonteCarlo);
        assert_eq!(decoded.mask.max_events(), Some(100));
        assert_eq!(decoded.mask.first_lumi, Some(3));
        assert_eq!(decoded.mask.first_run, None);
        assert_eq!(
            decoded.seeding,
            Some(Seeding::Automatic("AutomaticSeeding".to_string()))
        );
        assert!(!decoded.lhe_input);
    }

    #[test]
    fn test_decode_mc_negative_last_event() {
        let decoded = decode_positional(&args(&[
            "MC", ".", "[]", "{}", "1", "-1", "1", "1", "None", "True",
        ]))
        .unwrap();

        assert_eq!(decoded.mask.last_event, None);
        assert!(decoded.lhe_input);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("LHE_INPUT", "True").unwrap());
        assert!(parse_flag("LHE_INPUT", "1").unwrap());
        assert!(!parse_flag("LHE_INPUT", "0").unwrap());
        assert!(!parse_flag("LHE_INPUT", "false").unwrap());
        assert!(!parse_flag("LHE_INPUT", "None").unwrap());
        assert!(matches!(
            parse_flag("LHE_INPUT", "'yes'"),
            Err(TweakError::BadArgument { name: "LHE_INPUT", .. })
        ));
    }

    #[test]
    fn test_decode_mc_integer_lhe_flag() {
        let decoded = decode_positional(&args(&[
            "MC", ".", "[]", "{}", "1", "10", "1", "1", "None", "1",
        ]))
        .unwrap();
        assert!(decoded.lhe_input);
    }

    #[test]
    fn test_decode_mc_missing_first_lumi() {
        let result = decode_positional(&args(&[
            "MC", ".", "[]", "{}", "1", "10", "None", "1", "None", "False",
        ]));
        assert!(matches!(result, Err(TweakError::MissingArgument("FIRST_LUMI"))));
    }

    #[test]
    fn test_decode_missing_arguments() {
        let result = decode_positional(&args(&["Analysis", "."]));
        assert!(matches!(result, Err(TweakError::MissingArgument("INPUT_FILES"))));

        let result = decode_positional(&args(&["MC", ".", "[]", "{}", "1"]));
        assert!(matches!(result, Err(TweakError::MissingArgument("LAST_EVENT"))));
    }

    #[test]
    fn test_decode_extra_arguments() {
        let result = decode_positional(&args(&["Analysis", ".", "[]", "{}", "extra"]));
        assert!(matches!(result, Err(TweakError::BadArgument { .. })));
    }

    #[test]
    fn test_decode_bad_number() {
        let result = decode_positional(&args(&[
            "MC", ".", "[]", "{}", "one", "10", "1", "1", "None", "False",
        ]));
        assert!(matches!(
            result,
            Err(TweakError::BadArgument { name: "FIRST_EVENT", .. })
        ));
    }

    #[test]
    fn test_to_tweak() {
        let decoded = decode_positional(&args(&["Analysis", ".", "[]", "{}"])).unwrap();
        let tweak = decoded.to_tweak(vec!["o".to_string()]);
        assert_eq!(tweak.output_modules(), ["o".to_string()]);
    }
}
