use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens into a Rust source string.
///
/// Spaces are inserted between consecutive identifiers to avoid accidental
/// token merging (e.g. `foo bar` vs `foobar`).
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let needs_space = prev_was_ident && matches!(t, TokenTree::Ident(_));

        if needs_space {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = matches!(t, TokenTree::Ident(_));
    }

    out
}

/// Options accepted by `#[turnstile::main]` and `#[turnstile::test]`.
#[derive(Default)]
pub(crate) struct Options {
    /// String literal, quotes included.
    pub(crate) name: Option<String>,
    pub(crate) virtual_time: bool,
}

/// Parses `name = "..."` and `virtual_time` from an attribute.
pub(crate) fn parse_options(attr: TokenStream) -> Result<Options, String> {
    let mut options = Options::default();

    for arg in split_args(attr) {
        match arg.as_slice() {
            [TokenTree::Ident(key)] if key.to_string() == "virtual_time" => {
                options.virtual_time = true;
            }
            [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)]
                if key.to_string() == "name" && eq.as_char() == '=' =>
            {
                options.name = Some(value.to_string());
            }
            other => {
                return Err(format!(
                    "unsupported attribute argument `{}`",
                    tokens_to_string(other)
                ));
            }
        }
    }

    Ok(options)
}

/// The pieces of an annotated function the macros rebuild.
pub(crate) struct EntryPoint {
    /// Attributes, visibility and everything up to and including the name.
    pub(crate) head: String,

    /// Parameter list, without the parentheses.
    pub(crate) params: String,

    /// Function body, without the braces.
    pub(crate) body: String,
}

/// Splits `fn name(params) { body }` into its parts.
///
/// Return types and `async` are rejected: the body runs as the loop's first
/// synchronous turn.
pub(crate) fn parse_entry_point(item: TokenStream) -> Result<EntryPoint, String> {
    let tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(fn_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"))
    else {
        return Err(String::from("expected a function"));
    };

    if tokens[..fn_pos]
        .iter()
        .any(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        return Err(String::from(
            "the function must not be `async`; it receives the scheduler instead",
        ));
    }

    let (params, body) = match tokens.get(fn_pos + 2..).unwrap_or(&[]) {
        [TokenTree::Group(params), TokenTree::Group(body)]
            if params.delimiter() == Delimiter::Parenthesis
                && body.delimiter() == Delimiter::Brace =>
        {
            (params.stream().to_string(), body.stream().to_string())
        }
        _ => {
            return Err(String::from(
                "expected `fn name(scheduler: &Scheduler) { ... }` without return type or generics",
            ));
        }
    };

    Ok(EntryPoint {
        head: tokens_to_string(&tokens[..fn_pos + 2]),
        params,
        body,
    })
}

/// Turns an error message into a `compile_error!` invocation.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
