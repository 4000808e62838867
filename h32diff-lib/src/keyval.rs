use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy)]
enum State {
    Between,
    Comment,
    Key,
    Equal,
    Value,
    Quoted,
}

/// Splits strings like `block=0011223344556677 max_pairs=10 # comment` into key-value pairs.
///
/// Keys are lowercased, values can be quoted with `"`. On a malformed pair, the key read so far
/// is returned as an error and the iteration stops.
pub(crate) struct KeyValIter<'a> {
    chars: Peekable<Chars<'a>>,
    stop: bool,
}

impl<'a> KeyValIter<'a> {
    pub fn new(s: &'a str) -> KeyValIter<'a> {
        KeyValIter {
            chars: s.chars().peekable(),
            stop: false,
        }
    }
}

impl Iterator for KeyValIter<'_> {
    type Item = Result<(String, String), String>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.stop {
            return None;
        }
        let mut key = String::new();
        let mut val = String::new();
        let mut state = State::Between;
        loop {
            let c = self.chars.next();
            state = match (state, c) {
                (State::Between, None) | (State::Comment, None) => {
                    self.stop = true;
                    return None;
                }
                (State::Value, None) => {
                    self.stop = true;
                    return Some(Ok((key, val)));
                }
                (_, None) => break,
                (State::Comment, Some('\n')) => State::Between,
                (State::Comment, Some(_)) => State::Comment,
                (State::Between, Some('#')) => State::Comment,
                (State::Between, Some(c)) if c.is_whitespace() => State::Between,
                (State::Between, Some(c)) | (State::Key, Some(c))
                    if c.is_ascii_alphanumeric() || c == '_' =>
                {
                    key.push(c.to_ascii_lowercase());
                    State::Key
                }
                (State::Key, Some('=')) => State::Equal,
                (State::Equal, Some('"')) => State::Quoted,
                (State::Quoted, Some('"')) => return Some(Ok((key, val))),
                (State::Quoted, Some(c)) => {
                    val.push(c);
                    State::Quoted
                }
                (State::Value, Some(c)) if c.is_whitespace() => return Some(Ok((key, val))),
                (State::Value, Some('#')) => {
                    // comment directly after a value, skip it for the next call
                    while self.chars.next_if(|&c| c != '\n').is_some() {}
                    return Some(Ok((key, val)));
                }
                (State::Equal, Some(c)) | (State::Value, Some(c))
                    if c.is_ascii_alphanumeric() || c == '_' || c == '.' =>
                {
                    val.push(c);
                    State::Value
                }
                _ => break,
            };
        }
        self.stop = true;
        Some(Err(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn collect(s: &str) -> Vec<Result<(String, String), String>> {
        KeyValIter::new(s).collect()
    }
    fn ok(k: &str, v: &str) -> Result<(String, String), String> {
        Ok((k.to_owned(), v.to_owned()))
    }
    #[test]
    fn simple_pairs() {
        assert_eq!(
            collect("  max_pairs=10 Trials=3\nblock=0x00ff "),
            vec![ok("max_pairs", "10"), ok("trials", "3"), ok("block", "0x00ff")]
        );
        assert_eq!(collect(""), vec![]);
        assert_eq!(collect("   \n "), vec![]);
    }
    #[test]
    fn quotes_and_comments() {
        assert_eq!(
            collect("# search setup\nblock=\"0011 2233\" # trailing\nend=0xffff#x\nstart=1"),
            vec![ok("block", "0011 2233"), ok("end", "0xffff"), ok("start", "1")]
        );
    }
    #[test]
    fn malformed() {
        assert_eq!(collect("trials"), vec![Err("trials".to_owned())]);
        assert_eq!(collect("trials="), vec![Err("trials".to_owned())]);
        assert_eq!(
            collect("start=1 end=-5 trials=2"),
            vec![ok("start", "1"), Err("end".to_owned())]
        );
        assert_eq!(collect("=4"), vec![Err(String::new())]);
    }
}
