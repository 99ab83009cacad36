use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use tracing::{debug, info};

use ldifcheck::error::{LdifcheckError, Result, SchemaError, SchemaWarning};
use ldifcheck::print::{print_diagnostics, print_entries, print_schema, print_validation};
use ldifcheck::{
    parse_ldap_schema, parse_ldif, validate, LdifParseResult, SchemaIndex, SchemaParseResult,
    ValidationResult,
};

use crate::arguments::{Command, Format, OutputOpt};

pub const EXIT_DIAGNOSTICS: u8 = 1;
pub const EXIT_FAILURE: u8 = 2;

// ===========================================================================
// Input
// ===========================================================================

/// Read `path` as text, `-` meaning stdin. Invalid UTF-8 is replaced.
pub fn read_input(path: &Path) -> Result<String> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .map_err(|source| LdifcheckError::Read {
                path: "<stdin>".to_string(),
                source,
            })?;
        buf
    } else {
        fs::read(path).map_err(|source| LdifcheckError::Read {
            path: path.display().to_string(),
            source,
        })?
    };
    debug!(path = %path.display(), bytes = bytes.len(), "read input");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn load_schema(path: &Path) -> Result<SchemaParseResult> {
    let schema = parse_ldap_schema(&read_input(path)?);
    info!(
        attribute_types = schema.attribute_types.len(),
        object_classes = schema.object_classes.len(),
        errors = schema.errors.len(),
        "parsed schema"
    );
    Ok(schema)
}

fn load_ldif(path: &Path) -> Result<LdifParseResult> {
    let ldif = parse_ldif(&read_input(path)?);
    info!(
        entries = ldif.entries.len(),
        errors = ldif.errors.len(),
        "parsed LDIF"
    );
    Ok(ldif)
}

// ===========================================================================
// Reports
// ===========================================================================

#[derive(Debug, Serialize)]
struct SchemaReport<'a> {
    errors: &'a [SchemaError],
    warnings: &'a [SchemaWarning],
}

#[derive(Debug, Serialize)]
struct ValidateReport<'a> {
    ldif: &'a LdifParseResult,
    schema: SchemaReport<'a>,
    validation: &'a ValidationResult,
}

fn write_json<T: Serialize>(w: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    w.write_all(b"\n")?;
    Ok(())
}

fn exit_code(output: &OutputOpt, diagnostics: usize) -> ExitCode {
    if output.strict && diagnostics > 0 {
        debug!(diagnostics, "strict mode, reporting failure");
        ExitCode::from(EXIT_DIAGNOSTICS)
    } else {
        ExitCode::SUCCESS
    }
}

// ===========================================================================
// Commands
// ===========================================================================

pub fn run(command: &Command) -> Result<ExitCode> {
    let output = command.output();
    debug!(format = ?output.format, strict = output.strict, "running command");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = match command {
        Command::Parse { ldif, output } => do_parse(&mut out, ldif, output)?,
        Command::Schema { schema, output } => do_schema(&mut out, schema, output)?,
        Command::Validate {
            schema,
            ldif,
            annotate,
            output,
        } => do_validate(&mut out, schema, ldif, *annotate, output)?,
    };
    out.flush()?;
    Ok(code)
}

fn do_parse(w: &mut dyn Write, path: &Path, output: &OutputOpt) -> Result<ExitCode> {
    let ldif = load_ldif(path)?;
    match output.format {
        Format::Json => write_json(w, &ldif)?,
        Format::Text => {
            print_entries(w, &ldif, None)?;
            print_diagnostics(w, "error", &ldif.errors)?;
        }
    }
    Ok(exit_code(output, ldif.errors.len()))
}

fn do_schema(w: &mut dyn Write, path: &Path, output: &OutputOpt) -> Result<ExitCode> {
    let schema = load_schema(path)?;
    match output.format {
        Format::Json => write_json(w, &schema)?,
        Format::Text => {
            print_schema(w, &schema)?;
            print_diagnostics(w, "error", &schema.errors)?;
            print_diagnostics(w, "warning", &schema.warnings)?;
        }
    }
    Ok(exit_code(output, schema.errors.len()))
}

fn do_validate(
    w: &mut dyn Write,
    schema_path: &Path,
    ldif_path: &Path,
    annotate: bool,
    output: &OutputOpt,
) -> Result<ExitCode> {
    let schema = load_schema(schema_path)?;
    let ldif = load_ldif(ldif_path)?;
    let index = SchemaIndex::build(&schema);
    if index.is_empty() {
        return Err(LdifcheckError::User(format!(
            "no definitions found in schema {}",
            schema_path.display()
        )));
    }
    let result = validate(&ldif.entries, Some(&index));
    info!(findings = result.len(), "validated entries");

    match output.format {
        Format::Json => {
            let report = ValidateReport {
                ldif: &ldif,
                schema: SchemaReport {
                    errors: &schema.errors,
                    warnings: &schema.warnings,
                },
                validation: &result,
            };
            write_json(w, &report)?;
        }
        Format::Text => {
            if annotate {
                print_entries(w, &ldif, Some(&result))?;
            }
            print_diagnostics(w, "schema error", &schema.errors)?;
            print_diagnostics(w, "error", &ldif.errors)?;
            print_validation(w, &result)?;
        }
    }
    Ok(exit_code(
        output,
        schema.errors.len() + ldif.errors.len() + result.len(),
    ))
}
