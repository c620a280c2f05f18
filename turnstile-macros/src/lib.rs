mod utils;

use proc_macro::TokenStream;

/// Runs the annotated function as the first turn of a fresh scheduler, then
/// drives the loop to completion.
///
/// The function takes at most one parameter, which is bound to the
/// scheduler:
///
/// ```rust,ignore
/// #[turnstile::main(name = "app")]
/// fn main(scheduler: &Scheduler) {
///     scheduler.schedule_macrotask(|| println!("hello"), Duration::ZERO);
/// }
/// ```
///
/// Accepted arguments: `name = "..."` and `virtual_time`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match utils::parse_options(attr) {
        Ok(options) => options,
        Err(message) => return utils::compile_error(&message),
    };

    let entry = match utils::parse_entry_point(item) {
        Ok(entry) => entry,
        Err(message) => return utils::compile_error(&message),
    };

    let mut builder = String::from("::turnstile::SchedulerBuilder::new()");

    if let Some(name) = &options.name {
        builder.push_str(&format!(".name({name})"));
    }

    if options.virtual_time {
        builder.push_str(".virtual_time()");
    }

    let binding = bind_scheduler(&entry.params);

    let output = format!(
        "{head}() {{
            let __scheduler = {builder}.build();

            let __result = __scheduler
                .execute(|| {{
                    {binding}
                    {{ {body} }};
                }})
                .and_then(|()| __scheduler.run());

            if let ::core::result::Result::Err(error) = __result {{
                ::core::panic!(\"turnstile loop failed: {{error}}\");
            }}
        }}",
        head = entry.head,
        body = entry.body,
    );

    output
        .parse()
        .unwrap_or_else(|err| utils::compile_error(&format!("main macro error: {err}")))
}

/// Turns the annotated function into a `#[test]` running on a virtual-time
/// scheduler.
///
/// Every failure the loop reports (panicking callbacks, unhandled
/// rejections, failing scheduled emits) fails the test once the loop is
/// done, so assertions may live in any callback.
///
/// ```rust,ignore
/// #[turnstile::test]
/// fn test_delay(scheduler: &Scheduler) {
///     delay::<()>(scheduler, Duration::from_secs(60)).map(|()| assert!(true));
/// }
/// ```
///
/// Accepts an optional `name = "..."`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match utils::parse_options(attr) {
        Ok(options) => options,
        Err(message) => return utils::compile_error(&message),
    };

    let entry = match utils::parse_entry_point(item) {
        Ok(entry) => entry,
        Err(message) => return utils::compile_error(&message),
    };

    let mut builder = String::from("::turnstile::SchedulerBuilder::new().virtual_time()");

    if let Some(name) = &options.name {
        builder.push_str(&format!(".name({name})"));
    }

    let binding = bind_scheduler(&entry.params);

    let output = format!(
        "#[test]
        {head}() {{
            let __failures = ::std::rc::Rc::new(::std::cell::RefCell::new(
                ::std::vec::Vec::<::std::string::String>::new(),
            ));
            let __sink = __failures.clone();

            let __scheduler = {builder}
                .reporter(move |error| __sink.borrow_mut().push(error.to_string()))
                .build();

            let __result = __scheduler
                .execute(|| {{
                    {binding}
                    {{ {body} }};
                }})
                .and_then(|()| __scheduler.run());

            if let ::core::result::Result::Err(error) = __result {{
                ::core::panic!(\"turnstile loop failed: {{error}}\");
            }}

            let __failures = __failures.borrow();
            if !__failures.is_empty() {{
                ::core::panic!(
                    \"loop reported {{}} failure(s): {{:#?}}\",
                    __failures.len(),
                    *__failures
                );
            }}
        }}",
        head = entry.head,
        body = entry.body,
    );

    output
        .parse()
        .unwrap_or_else(|err| utils::compile_error(&format!("test macro error: {err}")))
}

/// `let <param> = &__scheduler;` for a declared parameter, nothing otherwise.
fn bind_scheduler(params: &str) -> String {
    let param = params.trim().trim_end_matches(',').trim();

    if param.is_empty() {
        String::new()
    } else {
        format!("let {param} = &__scheduler;")
    }
}
