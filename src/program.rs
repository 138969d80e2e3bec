// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Parsing Intcode program text

use std::num::ParseIntError;

use thiserror::Error;

/// Program text couldn't be turned into Intcode
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgramError {
    /// There was nothing but whitespace
    #[error("program text is empty")]
    Empty,
    /// A comma-separated token wasn't a decimal integer
    #[error("int #{index} ({token:?}) is not a valid integer: {source}")]
    InvalidToken {
        /// Position of the token, counting from 0
        index: usize,
        /// The offending token, with surrounding whitespace removed
        token: String,
        /// Why it didn't parse
        source: ParseIntError,
    },
}

/// Parse comma-separated decimal integers, as Advent of Code distributes Intcode programs.
///
/// Whitespace around each integer, including a trailing newline, is ignored.
///
/// ```
/// use intcode::parse_program;
/// assert_eq!(parse_program("1,0,0,0,99\n"), Ok(vec![1, 0, 0, 0, 99]));
/// assert!(parse_program("1,,99").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ProgramError::Empty`] if `text` is blank, and [`ProgramError::InvalidToken`] for
/// the first token that isn't an [i64].
pub fn parse_program(text: &str) -> Result<Vec<i64>, ProgramError> {
    if text.trim().is_empty() {
        return Err(ProgramError::Empty);
    }
    text.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(index, token)| {
            token.parse().map_err(|source| ProgramError::InvalidToken {
                index,
                token: token.to_owned(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(
            parse_program(" 109, -1,\n204 ,1125899906842624\r\n"),
            Ok(vec![109, -1, 204, 1_125_899_906_842_624])
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_program(""), Err(ProgramError::Empty));
        assert_eq!(parse_program(" \n"), Err(ProgramError::Empty));
        let Err(ProgramError::InvalidToken { index, token, .. }) = parse_program("1,2,x3,99") else {
            panic!("accepted garbage");
        };
        assert_eq!((index, token.as_str()), (2, "x3"));

        // trailing comma leaves an empty token
        assert!(matches!(
            parse_program("99,"),
            Err(ProgramError::InvalidToken { index: 1, .. })
        ));
    }
}
