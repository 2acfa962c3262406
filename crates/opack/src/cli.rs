//! Logic behind the `opack-pack` and `opack-unpack` binaries.
//!
//! - `opack-pack`:   encode JSON (stdin) to opack (stdout)
//! - `opack-unpack`: decode opack (stdin) to JSON (stdout)

use thiserror::Error;

use crate::{OPack, OPackError, OPackOptions, Value};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    OPack(#[from] OPackError),
    #[error("invalid argument: {0}")]
    Argument(String),
}

/// Parses `opack-pack` flags into codec options.
///
/// Recognized: `--no-index-values`, `--no-optimized-indexed`,
/// `--key-split N`, `--value-split N`, `--max-depth N`.
pub fn parse_options<I, S>(args: I) -> Result<OPackOptions, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_flags(args, true)
}

/// Parses `opack-unpack` flags: only `--max-depth N` and
/// `--max-output-bytes N`. Encoder-only flags are rejected.
pub fn parse_unpack_options<I, S>(args: I) -> Result<OPackOptions, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_flags(args, false)
}

fn parse_flags<I, S>(args: I, encoding: bool) -> Result<OPackOptions, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = OPackOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--no-index-values" if encoding => options.index_values = false,
            "--no-optimized-indexed" if encoding => options.write_optimized_indexed_types = false,
            flag @ ("--key-split" | "--value-split") if encoding => {
                let n = number(flag, args.next())?;
                if flag == "--key-split" {
                    options.max_table_split_for_key = n;
                } else {
                    options.max_table_split_for_value = n;
                }
            }
            flag @ "--max-depth" => options.max_depth = number(flag, args.next())?,
            flag @ "--max-output-bytes" if !encoding => {
                options.max_output_bytes = number(flag, args.next())?
            }
            other => return Err(CliError::Argument(other.to_owned())),
        }
    }
    Ok(options)
}

fn number<S: AsRef<str>>(flag: &str, value: Option<S>) -> Result<usize, CliError> {
    value
        .and_then(|v| v.as_ref().parse::<usize>().ok())
        .ok_or_else(|| CliError::Argument(format!("{flag} needs a number")))
}

/// Encodes a JSON document.
pub fn pack(json: &str, options: OPackOptions) -> Result<Vec<u8>, CliError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(OPack::with_options(options).encode(&Value::from(value))?)
}

/// Decodes a stream to a JSON string.
pub fn unpack(bytes: &[u8], options: OPackOptions) -> Result<String, CliError> {
    let value = OPack::with_options(options).decode(bytes)?;
    Ok(serde_json::to_string(&serde_json::Value::from(value))?)
}
