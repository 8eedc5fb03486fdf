//! Recovers the trailing arguments of an invocation exactly as they were typed.
//!
//! The tail is cut from the raw command line instead of being rebuilt from
//! parsed arguments: re-quoting could change the bytes the target sees.
//!
//! Known fragility: the first occurrence of `argv[0]` in the raw text wins,
//! even when quoting made an earlier substring look like the program name.

/// `argv[0]` could not be found in the raw command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgvMismatch;

const SPACE: u8 = b' ';
const TAB: u8 = b'\t';
const QUOTE: u8 = b'"';

/// Returns everything after the program name, starting at the first space
/// that follows it (space included), or an empty slice when no space follows.
///
/// Works on any code unit: `u16` for `GetCommandLineW`, `u8` for byte text.
pub fn trailing_args<'a, T>(raw: &'a [T], argv0: &[T]) -> Result<&'a [T], ArgvMismatch>
where
    T: Copy + PartialEq + From<u8>,
{
    let start = find(raw, argv0).ok_or(ArgvMismatch)?;
    let rest = &raw[start + argv0.len()..];
    let tail = rest
        .iter()
        .position(|&unit| unit == T::from(SPACE))
        .map_or(&rest[rest.len()..], |space| &rest[space..]);
    Ok(tail)
}

/// `target` followed by `tail`, the target quoted when it contains blanks.
pub fn child_command_line<T>(target: &[T], tail: &[T]) -> Vec<T>
where
    T: Copy + PartialEq + From<u8>,
{
    let quote = T::from(QUOTE);
    let needs_quotes = target.first() != Some(&quote)
        && target
            .iter()
            .any(|&unit| unit == T::from(SPACE) || unit == T::from(TAB));

    let mut line = Vec::with_capacity(target.len() + tail.len() + 2);
    if needs_quotes {
        line.push(quote);
    }
    line.extend_from_slice(target);
    if needs_quotes {
        line.push(quote);
    }
    line.extend_from_slice(tail);
    line
}

fn find<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
