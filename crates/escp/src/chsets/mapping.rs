//! # Textual mapping files
//!
//! Extra code pages can be supplied as plain-text files with one
//! `0xNN 0xNNNN` pair per line (`#` starts a comment), the format used
//! by the Unicode consortium's published code-page maps. Tables built
//! this way are registered in the encoding registry at startup.

use std::char::REPLACEMENT_CHARACTER;

use displaydoc::Display;
use nom::{
    bytes::complete::tag,
    character::complete::{hex_digit1, space1},
    combinator::map_res,
    error::ErrorKind,
    sequence::{preceded, tuple},
    Finish, IResult, Offset,
};
use thiserror::Error;

use super::tables::Table;

/// Error when parsing a mapping file
#[derive(Debug, Display, Error)]
pub enum MappingError {
    /// failed to parse ({2:?} at {0}:{1})
    Problem(usize, usize, ErrorKind),
}

fn hex_u8(input: &str) -> IResult<&str, u8> {
    preceded(
        tag("0x"),
        map_res(hex_digit1, |src| u8::from_str_radix(src, 16)),
    )(input)
}

fn hex_u32(input: &str) -> IResult<&str, u32> {
    preceded(
        tag("0x"),
        map_res(hex_digit1, |src| u32::from_str_radix(src, 16)),
    )(input)
}

fn p_mapping_line(input: &str) -> IResult<&str, (u8, u32)> {
    tuple((hex_u8, preceded(space1, hex_u32)))(input)
}

/// Parse a mapping file into a decoding table. Unlisted byte values
/// decode to U+FFFD.
pub fn p_mapping_file(input: &str) -> Result<Table, MappingError> {
    let mut chars = [REPLACEMENT_CHARACTER; 256];
    for (num, line) in input.lines().enumerate() {
        let valid = line.split('#').next().unwrap().trim();
        if !valid.is_empty() {
            let (_, (key, value)) = p_mapping_line(valid)
                .finish()
                .map_err(|e| MappingError::Problem(num, line.offset(e.input), e.code))?;
            if let Some(chr) = char::from_u32(value) {
                chars[key as usize] = chr;
            }
        }
    }
    Ok(Table { chars })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_comments() {
        let src = "# sample\n0x41 0x0041\n0x80 0x00C7 # C cedilla\n";
        let table = p_mapping_file(src).unwrap();
        assert_eq!(table.decode(0x41), 'A');
        assert_eq!(table.decode(0x80), 'Ç');
        assert_eq!(table.decode(0x81), REPLACEMENT_CHARACTER);
    }

    #[test]
    fn reports_line_and_column() {
        let src = "0x41 bogus\n";
        let err = p_mapping_file(src).unwrap_err();
        let MappingError::Problem(line, _, _) = err;
        assert_eq!(line, 0);
    }
}
