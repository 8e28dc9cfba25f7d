//! Trigger-prefix matching and command tokenizing.

/// A parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Trigger prefix that matched.
    pub prefix: &'a str,
    /// Lower-cased command name.
    pub name: String,
    pub args: Vec<String>,
}

/// Parse `body` as `<prefix><name> <args...>`.
///
/// The longest matching prefix wins, so `"!!"` beats `"!"`. Returns `None`
/// when no prefix matches or nothing follows the prefix.
pub fn parse_invocation<'a>(body: &str, prefixes: &'a [String]) -> Option<Invocation<'a>> {
    let prefix = prefixes
        .iter()
        .filter(|p| !p.is_empty() && body.starts_with(p.as_str()))
        .max_by_key(|p| p.len())?;

    let mut tokens = body[prefix.len()..].split_whitespace();
    let name = tokens.next()?.to_lowercase();
    let args = tokens.map(str::to_string).collect();

    Some(Invocation {
        prefix: prefix.as_str(),
        name,
        args,
    })
}
