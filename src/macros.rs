/// Field separator accepted between sentence tokens: comma, pipe or space.
macro_rules! sep {
    () => {
        r"[,| ]"
    };
}

/// Optional leading `$` of a sentence.
macro_rules! start {
    () => {
        r"^\$?"
    };
}

/// Trailing remainder of a sentence (checksum and anything after the last
/// decoded field), up to an optional carriage return.
macro_rules! rest {
    () => {
        r"(?P<value>.*?)\r?$"
    };
}

/// Fetches named fields from a `FieldMap`.
///
/// Evaluates to a tuple of `&str` in the order given. The enclosing function
/// returns `None` as soon as one of the fields is missing or empty, so every
/// getter built on top of it degrades to an absent value instead of failing.
macro_rules! fields {
    ($map:expr; $($name:expr),+) => {
        (
            $(
                match $map.get($name) {
                    Some(v) if !v.is_empty() => v,
                    _ => return None,
                }
            ),+
        )
    };
}
