//! End-to-end tests driving `transform_source` on whole files.

use retrofit_core::{transform_source, Diagnostics, FileOutcome, Options, TransformError};

fn apply(source: &str) -> FileOutcome {
    let diag = Diagnostics::quiet();
    transform_source(source, "test.ts", None, &Options::default(), &diag)
        .expect("transform failed")
}

fn output(source: &str) -> String {
    apply(source).output.expect("expected the file to change")
}

#[test]
fn file_without_the_import_is_untouched() {
    let src = "import { waitFor } from \"other-utils\";\ncheck(() => {\n  return \"ok\";\n}, \"ok\");\n";
    let outcome = apply(src);
    assert!(outcome.output.is_none());
    assert_eq!(outcome.rewrites, 0);
}

#[test]
fn same_symbol_from_another_module_is_untouched() {
    let src = "import { check } from \"./my-check\";\nawait check(() => {\n  return \"ok\";\n}, \"ok\");\n";
    assert!(apply(src).output.is_none());
}

#[test]
fn exact_literal_return_is_dropped_and_import_swapped() {
    let src = "\
import { check } from \"next-test-utils\";

it(\"renders\", async () => {
  await check(async () => {
    const html = await browser.eval(\"document.body.innerHTML\");
    doThing(html);
    return \"ready\";
  }, \"ready\");
});
";
    let outcome = apply(src);
    assert_eq!(outcome.rewrites, 1);
    let out = outcome.output.unwrap();
    assert!(out.contains("import { retry } from \"next-test-utils\";"));
    assert!(out.contains("await retry(async () => {"));
    assert!(out.contains("doThing(html);"));
    assert!(!out.contains("return \"ready\""));
    assert!(!out.contains("check("));
}

#[test]
fn numeric_expectation_becomes_to_be() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  const res = await fetchViaHTTP(appPort, \"/api\");
  return res.status;
}, 200);
";
    let out = output(src);
    assert!(out.contains("expect(res.status).toBe(200);"));
    assert!(out.contains("await retry(async () => {"));
}

#[test]
fn ternary_collapses_to_condition_assertion() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  const html = await render();
  return html.includes(\"loaded\") ? \"done\" : \"pending\";
}, \"done\");
";
    let out = output(src);
    assert!(out.contains("expect(html.includes(\"loaded\")).toBeTruthy();"));
    assert!(!out.contains("?"));
}

#[test]
fn ternary_with_success_in_alternate_uses_falsy() {
    let src = "\
import { check } from \"next-test-utils\";

await check(() => {
  return hasError() ? \"broken\" : \"done\";
}, \"done\");
";
    let out = output(src);
    assert!(out.contains("expect(hasError()).toBeFalsy();"));
}

#[test]
fn regex_expectation_awaits_and_matches() {
    let src = "\
import { check } from \"next-test-utils\";

await check(() => next.cliOutput, /compiled successfully/);
";
    let out = output(src);
    assert!(out.contains("await retry(async () => {"));
    assert!(out.contains("expect(await next.cliOutput).toMatch(/compiled successfully/);"));
}

#[test]
fn regex_pattern_matching_the_returned_literal_drops_it() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  const out = await next.render(\"/\");
  return \"compiled successfully\";
}, /compiled successfully/);
";
    let outcome = apply(src);
    assert_eq!(outcome.rewrites, 1);
    let out = outcome.output.unwrap();
    assert!(out.contains("import { retry } from \"next-test-utils\";"));
    assert!(out.contains("const out = await next.render(\"/\");"));
    assert!(!out.contains("return \"compiled successfully\""));
    assert!(!out.contains("expect"));
}

#[test]
fn ternary_with_non_literal_expectation_is_a_hard_error() {
    let src = "\
import { check } from \"next-test-utils\";

await check(() => {
  return cond ? \"yes\" : \"no\";
}, expectedValue);
";
    let diag = Diagnostics::quiet();
    let result = transform_source(src, "test.ts", None, &Options::default(), &diag);
    assert!(matches!(result, Err(TransformError::Invariant(_))));
}

#[test]
fn string_expectation_falls_back_to_to_equal() {
    let src = "\
import { check } from \"next-test-utils\";

await check(() => {
  return getStatus();
}, \"ready\");
";
    let out = output(src);
    assert!(out.contains("expect(await getStatus()).toEqual(\"ready\");"));
    assert!(out.contains("retry(async () => {"));
}

#[test]
fn transform_is_idempotent() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  return res.status;
}, 200);
";
    let first = output(src);
    let second = apply(&first);
    assert!(second.output.is_none());
    assert_eq!(second.rewrites, 0);
}

#[test]
fn contradictory_return_keeps_the_call_and_import() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  if (bad) return \"fail\";
  return \"ok\";
}, \"ok\");
";
    let outcome = apply(src);
    assert!(outcome.output.is_none());
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.rewrites, 0);
}

#[test]
fn failing_branch_is_rewritten_into_an_assertion() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  const html = await render();
  if (!html.includes(\"good\")) {
    return \"bad html\";
  }
  return \"ok\";
}, \"ok\");
";
    let out = output(src);
    assert!(out.contains("expect(!html.includes(\"good\")).toBeTruthy();"));
    assert!(!out.contains("return \"bad html\""));
    assert!(!out.contains("if ("));
}

#[test]
fn branch_rescue_persists_when_a_later_violation_blocks() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  if (!ok) {
    return \"fail\";
  }
  if (weird) return \"worse\";
  return \"ok\";
}, \"ok\");
";
    let outcome = apply(src);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.rewrites, 0);
    // The first disagreeing return sat in a braced branch and was rescued
    // before the unbraced one blocked the site; that rescue stays in the
    // output while the call and its import are left alone.
    let out = outcome.output.unwrap();
    assert!(out.contains("expect(!ok).toBeTruthy();"));
    assert!(out.contains("if (weird) return \"worse\";"));
    assert!(out.contains("return \"ok\";"));
    assert!(out.contains("check("));
    assert!(out.contains("import { check } from \"next-test-utils\";"));
}

#[test]
fn non_arrow_callback_leaves_the_file_alone() {
    let src = "\
import { check } from \"next-test-utils\";

await check(pollFn, \"ok\");
";
    let outcome = apply(src);
    assert!(outcome.output.is_none());
    assert_eq!(outcome.skipped, 1);
}

#[test]
fn async_demotion_when_no_await_remains() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  someStatus = readStatus();
  return someStatus === \"ready\" ? \"done\" : \"pending\";
}, \"done\");
";
    let out = output(src);
    assert!(out.contains("await retry(() => {"));
    assert!(out.contains("expect(someStatus === \"ready\").toBeTruthy();"));
}

#[test]
fn untouched_statements_keep_their_exact_text() {
    let src = "\
import { check } from \"next-test-utils\";

// leading comment stays
const port = await findPort(); /* tail */

await check(async () => {
  return res.status; // inline note
}, 200);

afterAll(() => stop());
";
    let out = output(src);
    assert!(out.contains("// leading comment stays\nconst port = await findPort(); /* tail */"));
    assert!(out.contains("afterAll(() => stop());"));
}

#[test]
fn wrapped_call_without_expectation_does_not_touch_imports() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  await poke();
});
";
    let outcome = apply(src);
    assert_eq!(outcome.wrapped, 1);
    assert_eq!(outcome.rewrites, 0);
    let out = outcome.output.unwrap();
    // The call is wrapped, but without a full rewrite the import list
    // stays as it was.
    assert!(out.contains("import { check } from \"next-test-utils\";"));
    assert!(out.contains("await retry(async () => {"));
}

#[test]
fn import_with_existing_replacement_is_not_duplicated() {
    let src = "\
import { check, retry } from \"next-test-utils\";

await check(async () => {
  return res.status;
}, 200);
";
    let out = output(src);
    assert_eq!(out.matches("retry").count(), 2); // one import, one call
    assert!(out.contains("import { retry } from \"next-test-utils\";"));
}

#[test]
fn multiple_call_sites_in_one_file() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  return res.status;
}, 200);

await check(() => {
  return \"ok\";
}, \"ok\");
";
    let outcome = apply(src);
    assert_eq!(outcome.rewrites, 2);
    let out = outcome.output.unwrap();
    assert!(out.contains("expect(res.status).toBe(200);"));
    assert!(!out.contains("check("));
}

#[test]
fn javascript_files_are_supported_too() {
    let src = "\
import { check } from \"next-test-utils\";

await check(async () => {
  return res.status;
}, 200);
";
    let diag = Diagnostics::quiet();
    let outcome = transform_source(src, "test.js", None, &Options::default(), &diag).unwrap();
    assert!(outcome.output.unwrap().contains("expect(res.status).toBe(200);"));
}
