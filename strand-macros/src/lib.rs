//! Procedural macros for the strand executor.
//!
//! These are re-exported from the `strand` crate and expand to paths under
//! `::strand`, so they are meant to be used through it.

mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Waits on several futures concurrently and returns all their outputs as a
/// tuple, in argument order.
///
/// Expands into nested `::strand::future::join` calls, so every future is
/// polled on each attempt until it completes, and never after.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    let exprs = args
        .iter()
        .map(|tokens| utils::tokens_to_string(tokens))
        .collect::<Vec<_>>();

    match exprs.as_slice() {
        [] => return utils::parse_or_error("()", "join"),
        [single] => return utils::parse_or_error(&format!("{{ ({single}).await }}"), "join"),
        _ => {}
    }

    // ((a, b), c) ... folded from the left.
    let mut future = format!("({})", exprs[0]);
    let mut pattern = String::from("__j0");

    for (i, expr) in exprs.iter().enumerate().skip(1) {
        future = format!("::strand::future::join({future}, ({expr}))");
        pattern = format!("({pattern}, __j{i})");
    }

    let outputs = (0..exprs.len())
        .map(|i| format!("__j{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let output = format!(
        "{{
            let {pattern} = {future}.await;
            ({outputs})
        }}"
    );

    utils::parse_or_error(&output, "join")
}

/// Waits on several futures and runs the handler of the first one to
/// complete.
///
/// ```rust,ignore
/// let winner = strand::select! {
///     fast() => |v| format!("fast: {v}"),
///     slow() => |v| format!("slow: {v}"),
/// };
/// ```
///
/// Branches are polled in order on every attempt, so the first listed
/// branch wins ties. The other futures are dropped unfinished, unless they
/// were passed by reference (`&mut fut`), in which case they can be selected
/// on again.
///
/// Two extra branches take a plain expression instead of a handler:
///
/// - `complete => expr` is taken once every future reports
///   `strand::future::FusedFuture::is_terminated`, which all branches must
///   then implement (wrap them with `future::fuse`);
/// - `default => expr` is taken when no future is ready on this poll.
///
/// ```rust,ignore
/// let mut a = fuse(ready(4));
/// let mut b = fuse(ready(6));
/// let mut total = 0;
///
/// loop {
///     strand::select! {
///         &mut a => |v| total += v,
///         &mut b => |v| total += v,
///         complete => break,
///     };
/// }
/// ```
#[proc_macro]
pub fn select(input: TokenStream) -> TokenStream {
    let branches = match utils::parse_select_branches(input) {
        Ok(branches) => branches,
        Err(msg) => return utils::compile_error(&msg),
    };
    let count = branches.futures.len();

    if count == 0 {
        return utils::compile_error("select requires at least one future branch");
    }

    let mut out = String::new();
    out.push_str("{\n");

    let generics = (1..=count)
        .map(|i| format!("__T{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    out.push_str(&format!("enum __SelectOutput<{generics}> {{\n"));
    for i in 1..=count {
        out.push_str(&format!("    __F{i}(__T{i}),\n"));
    }
    if branches.complete.is_some() {
        out.push_str("    __Complete,\n");
    }
    if branches.default.is_some() {
        out.push_str("    __Default,\n");
    }
    out.push_str("}\n\n");

    for (i, (future, _handler)) in branches.futures.iter().enumerate() {
        let idx = i + 1;
        out.push_str(&format!(
            "let mut __f{idx} = ::std::pin::pin!({future});\n"
        ));
    }

    out.push_str("\nlet __output = ::strand::future::poll_fn(move |cx| {\n");
    out.push_str("    use ::std::future::Future;\n");
    out.push_str("    use ::std::task::Poll;\n");

    if branches.complete.is_some() {
        let terminated = (1..=count)
            .map(|i| format!("::strand::future::FusedFuture::is_terminated(&__f{i})"))
            .collect::<Vec<_>>()
            .join(" && ");

        out.push_str(&format!(
            "    if {terminated} {{\n\
                 return Poll::Ready(__SelectOutput::__Complete);\n\
             }}\n"
        ));
    }

    for i in 1..=count {
        out.push_str(&format!(
            "    if let Poll::Ready(val) = __f{i}.as_mut().poll(cx) {{\n\
                 return Poll::Ready(__SelectOutput::__F{i}(val));\n\
             }}\n"
        ));
    }

    if branches.default.is_some() {
        out.push_str("    Poll::Ready(__SelectOutput::__Default)\n");
    } else {
        out.push_str("    Poll::Pending\n");
    }
    out.push_str("}).await;\n\n");

    out.push_str("match __output {\n");
    for (i, (_future, handler)) in branches.futures.iter().enumerate() {
        let idx = i + 1;
        out.push_str(&format!(
            "    __SelectOutput::__F{idx}(val) => ({handler})(val),\n"
        ));
    }
    if let Some(complete) = &branches.complete {
        out.push_str(&format!("    __SelectOutput::__Complete => {{ {complete} }}\n"));
    }
    if let Some(default) = &branches.default {
        out.push_str(&format!("    __SelectOutput::__Default => {{ {default} }}\n"));
    }
    out.push_str("}\n");
    out.push_str("}\n");

    utils::parse_or_error(&out, "select")
}

/// Runs an `async fn main` on a fresh strand runtime.
///
/// ```rust,ignore
/// #[strand::main(name = "server")]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_entry(attr, item, false)
}

/// Runs an `async` test function on a fresh strand runtime.
///
/// The test may return a value (such as `anyhow::Result<()>`), which is
/// passed through to the test harness.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_entry(attr, item, true)
}

/// Shared expansion of `#[main]` and `#[test]`: the body moves into an
/// inner `async fn` with the same return type, which the runtime then
/// blocks on.
fn expand_entry(attr: TokenStream, item: TokenStream, is_test: bool) -> TokenStream {
    let options = match utils::parse_entry_options(attr) {
        Ok(options) => options,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let Some(async_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    else {
        return utils::compile_error("the `async` keyword is missing from the function");
    };
    tokens.remove(async_pos);

    let Some(body_pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return utils::compile_error("expected a function body");
    };

    let Some(args_pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"))
        .and_then(|fn_pos| {
            tokens.iter().skip(fn_pos).position(
                |t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Parenthesis),
            ).map(|offset| fn_pos + offset)
        })
    else {
        return utils::compile_error("expected a function signature");
    };

    let body = match &tokens[body_pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let return_type = utils::return_type(&tokens[args_pos + 1..body_pos]);
    let signature = match return_type {
        Some(ty) => format!("async fn __strand_body() -> {ty}"),
        None => String::from("async fn __strand_body()"),
    };

    let mut builder = String::from("::strand::Builder::new()");
    if let Some(name) = options.name {
        builder.push_str(&format!(".name({name})"));
    }
    builder.push_str(".build()");

    let new_block = format!(
        "{{
            {signature} {{ {body} }}

            let runtime = {builder};
            runtime.block_on(__strand_body())
        }}"
    );

    let Ok(stream) = new_block.parse::<TokenStream>() else {
        return utils::compile_error("failed to expand the function body");
    };
    tokens[body_pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));

    let mut result: Vec<TokenTree> = Vec::new();
    if is_test {
        result.extend("#[::core::prelude::v1::test]".parse::<TokenStream>().into_iter().flatten());
    }
    result.extend(tokens);

    result.into_iter().collect()
}
