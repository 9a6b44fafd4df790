// Copyright (C) 2026 beanwire contributors
//
// This file is part of beanwire.
//
// beanwire is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// beanwire is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with beanwire.  If not, see <http://www.gnu.org/licenses/>.

// If I try to document this file at this level, it collides with the corresponding docs in
// lib.rs when I run `cargo doc`; see the well-known src/{main,lib}.rs quirk. A CLI ought to be
// self-documenting via --help anyway.

use beanwire::demos::{self, Person};
use beanwire::externalizable::Externalizable;
use clap::{value_parser, Arg, Command};
use env_logger::Env;
use parse_display::Display;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, Display)]
enum Cause {
    #[display("another crate's or module's error-- cf. source")]
    Other,
    #[display("unrecognized record type {0:?}-- known types: person")]
    UnknownRecordType(String),
    #[display("unrecognized output format {0:?}-- expected display or json")]
    UnknownFormat(String),
}

#[derive(Debug, Display)]
#[display("beanwire-dump error: {cause} source (if any): {source}")]
struct Error {
    cause: Cause,
    #[display("{0:?}")]
    source: Option<Box<dyn std::error::Error>>,
}

impl Error {
    fn new(cause: Cause) -> Error {
        Error {
            cause,
            source: None,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<beanwire::error::Error> for Error {
    fn from(err: beanwire::error::Error) -> Self {
        Error {
            cause: Cause::Other,
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            cause: Cause::Other,
            source: Some(Box::new(err)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Display,
    Json,
}

impl TryFrom<&str> for OutputFormat {
    type Error = Error;
    fn try_from(s: &str) -> Result<Self, Error> {
        match s {
            "display" => Ok(OutputFormat::Display),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::new(Cause::UnknownFormat(other.to_string()))),
        }
    }
}

/// Reads one 4-byte big-endian length prefix followed by that many bytes of
/// record payload from `r`, or `Ok(None)` on a clean end-of-stream at a
/// record boundary.
fn read_one_record(r: &mut impl Read) -> Result<Option<Vec<u8>>, Error> {
    let mut len_bytes = [0u8; 4];
    match r.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_bytes) as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(Some(buf))
}

fn dump(path: &Path, type_name: &str, format: OutputFormat) -> Result<(), Error> {
    if type_name != "person" {
        return Err(Error::new(Cause::UnknownRecordType(type_name.to_string())));
    }
    demos::register_demo_types();

    let mut r = BufReader::new(File::open(path)?);
    let mut count = 0usize;
    while let Some(bytes) = read_one_record(&mut r)? {
        let mut person = Person::default();
        person.read_external(&mut bytes.as_slice())?;
        match format {
            OutputFormat::Display => println!("{person:#?}"),
            OutputFormat::Json => println!("{}", serde_json::to_string(&person).unwrap()),
        }
        count += 1;
    }
    log::info!("dumped {count} record(s) from {}", path.display());
    Ok(())
}

fn main() -> Result<(), Error> {
    let matches = Command::new("beanwire-dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("beanwire-dump -- decode and print a stream of beanwire records")
        .long_about(
            "Reads a file of concatenated, length-framed beanwire records of a single known \
             record type and prints each one, either in Rust's own Debug form or as JSON.",
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("produce more copious output")
                .required(false)
                .num_args(0),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .short('t')
                .help("record type to decode (currently only \"person\")")
                .num_args(1)
                .default_value("person"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("output format: display or json")
                .num_args(1)
                .default_value("display"),
        )
        .arg(
            Arg::new("file")
                .help("file of concatenated, length-framed beanwire records")
                .index(1)
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();

    env_logger::init_from_env(Env::default().filter_or(
        "RUST_LOG",
        if matches.get_flag("verbose") {
            "debug"
        } else {
            "info"
        },
    ));

    let type_name = matches
        .get_one::<String>("type")
        .expect("has a default value");
    let format = matches
        .get_one::<String>("format")
        .expect("has a default value");
    let file = matches.get_one::<PathBuf>("file").expect("required");

    dump(file, type_name, OutputFormat::try_from(format.as_str())?)
}
