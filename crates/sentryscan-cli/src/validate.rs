//! Pure flag validation. Kept separate from [`crate::cli::Cli`] so the
//! rules can be unit tested without going through `clap`'s argument
//! parser.

use crate::cli::Cli;
use sentryscan_core::error::{Error, Result};
use sentryscan_formats::output::OutputFormat;

/// One parsed `-o FORMAT=PATH`.
pub struct OutputSpec {
    pub format: OutputFormat,
    pub path: String,
}

/// Everything downstream wiring needs, derived from `Cli` once
/// validation has passed.
pub struct ValidatedArgs {
    pub result_format: Option<OutputFormat>,
    pub result_path: Option<String>,
    pub outputs: Vec<OutputSpec>,
}

pub fn validate(cli: &Cli) -> Result<ValidatedArgs> {
    if cli.result.is_none() && cli.outputs.is_empty() {
        return Err(Error::Config(
            "either --result or --o needs to be set".to_string(),
        ));
    }

    let result_format = match &cli.result {
        Some(path) => {
            let format = OutputFormat::from_extension(std::path::Path::new(path)).ok_or_else(|| {
                Error::Config(format!(
                    "--result path '{path}' has an unrecognized extension"
                ))
            })?;
            Some(format)
        }
        None => None,
    };

    if cli.image_platform.is_some() && cli.remote_image.is_none() {
        return Err(Error::Config(
            "--image-platform requires --remote-image".to_string(),
        ));
    }

    if cli.root.is_some() && cli.windows_all_drives {
        return Err(Error::Config(
            "--root and --windows-all-drives are mutually exclusive".to_string(),
        ));
    }

    let outputs = cli
        .outputs
        .iter()
        .map(|raw| parse_output_spec(raw))
        .collect::<Result<Vec<_>>>()?;

    for (flag, values) in [
        ("--extractors", &cli.extractors),
        ("--detectors", &cli.detectors),
        ("--skip-dirs", &cli.skip_dirs),
    ] {
        if values.iter().any(|v| v.is_empty()) {
            return Err(Error::Config(format!("{flag} may not contain empty entries")));
        }
    }

    Ok(ValidatedArgs {
        result_format,
        result_path: cli.result.clone(),
        outputs,
    })
}

fn parse_output_spec(raw: &str) -> Result<OutputSpec> {
    let (format_token, path) = raw.split_once('=').ok_or_else(|| {
        Error::Config(format!("-o value '{raw}' must be FORMAT=PATH"))
    })?;
    let format = OutputFormat::parse(format_token)
        .ok_or_else(|| Error::Config(format!("-o value '{raw}' has an unrecognized format '{format_token}'")))?;
    if path.is_empty() {
        return Err(Error::Config(format!("-o value '{raw}' has an empty path")));
    }
    Ok(OutputSpec {
        format,
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["sentryscan"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn missing_result_and_o_is_rejected() {
        let cli = parse(&["--root", "/"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("either --result or --o needs to be set"));
    }

    #[test]
    fn result_with_recognized_extension_is_accepted() {
        let cli = parse(&[
            "--root",
            "/",
            "--result",
            "result.textproto",
            "--extractors",
            "java,python",
            "--detectors",
            "cve,cis",
            "--skip-dirs",
            "path1,path2",
        ]);
        let validated = validate(&cli).unwrap();
        assert_eq!(validated.result_format, Some(OutputFormat::TextProto));
    }

    #[test]
    fn image_platform_without_remote_image_is_rejected() {
        let cli = parse(&["--result", "r.textproto", "--image-platform", "linux/amd64"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn root_and_windows_all_drives_are_mutually_exclusive() {
        let cli = parse(&["--result", "r.textproto", "--root", "/", "--windows-all-drives"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn o_flag_is_parsed_into_format_and_path() {
        let cli = parse(&["-o", "cdx-json=out.json"]);
        let validated = validate(&cli).unwrap();
        assert_eq!(validated.outputs.len(), 1);
        assert_eq!(validated.outputs[0].format, OutputFormat::CdxJson);
        assert_eq!(validated.outputs[0].path, "out.json");
    }

    #[test]
    fn malformed_o_flag_is_rejected() {
        let cli = parse(&["-o", "cdx-json-without-path"]);
        assert!(validate(&cli).is_err());
    }
}
