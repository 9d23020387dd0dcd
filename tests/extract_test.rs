use sentinel::{extract, extract_file, FunctionRecord, LanguageTag};

fn names(records: &[FunctionRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

/// Each record's code is exactly the lines it claims to span.
fn assert_spans_match(source: &str, records: &[FunctionRecord]) {
    let lines: Vec<&str> = source.split('\n').collect();
    for r in records {
        let span = lines[r.line_start - 1..r.line_end].join("\n");
        assert_eq!(r.code, span, "span mismatch for {}", r.name);
    }
}

const PYTHON: &str = "\
import math

def area(r):
    return math.pi * r * r


def greet(name: str, punctuation: str = \"!\") -> str:
    if not name:

        return \"hello\" + punctuation
    return \"hello \" + name + punctuation

class Shape:
    def scale(self, factor):
        return factor
";

const JAVA: &str = "\
public class Calc {
    public static int add(int a, int b) {
        return a + b;
    }

    private String label(String prefix)
    {
        if (prefix == null) {
            return \"?\";
        }
        return prefix;
    }
}
";

const GO: &str = "\
package main

func Add(a int, b int) int {
\treturn a + b
}

func (c *Counter) Inc(step int) {
\tfor i := 0; i < step; i++ {
\t\tc.n++
\t}
}
";

const C: &str = "\
#include <stdio.h>

int add(int a, int b) {
    return a + b;
}

static char* dup(const char *s) {
    if (s) {
        return 0;
    }
    return 0;
}
";

const TS: &str = "\
export function add(a: number, b: number): number {
  return a + b;
}

export const twice = async (x: number) => {
  return x * 2;
};
";

#[test]
fn python_functions_in_order_with_exact_spans() {
    let records = extract_file(PYTHON, "geometry.py");
    assert_eq!(names(&records), ["area", "greet", "scale"]);
    assert_spans_match(PYTHON, &records);

    let area = &records[0];
    assert_eq!((area.line_start, area.line_end), (3, 4));

    // interior blank line kept, nested block included
    let greet = &records[1];
    assert_eq!((greet.line_start, greet.line_end), (7, 11));
    assert!(greet.code.contains("\n\n        return"));
    assert_eq!(greet.parameters[1].default_value.as_deref(), Some("\"!\""));

    assert_eq!(records[2].parameters.len(), 1);
    assert_eq!(records[2].parameters[0].name, "factor");
}

#[test]
fn java_allman_and_kr_bodies() {
    let records = extract_file(JAVA, "Calc.java");
    assert_eq!(names(&records), ["add", "label"]);
    assert_spans_match(JAVA, &records);
    assert_eq!((records[1].line_start, records[1].line_end), (6, 12));
    assert_eq!(records[1].parameters[0].ty, "String");
}

#[test]
fn go_methods_and_nested_loops() {
    let records = extract_file(GO, "main.go");
    assert_eq!(names(&records), ["Add", "Inc"]);
    assert_spans_match(GO, &records);
    assert_eq!(records[1].line_end, 11);
    assert_eq!(records[1].parameters[0].name, "step");
}

#[test]
fn c_pointer_return_types() {
    let records = extract_file(C, "util.c");
    assert_eq!(names(&records), ["add", "dup"]);
    assert_spans_match(C, &records);
    assert_eq!(records[1].parameters[0].name, "s");
}

#[test]
fn typescript_declarations_and_arrows() {
    let records = extract_file(TS, "math.ts");
    assert_eq!(names(&records), ["add", "twice"]);
    assert_spans_match(TS, &records);
    assert!(records.iter().all(|r| r.language == LanguageTag::TypeScript));
}

#[test]
fn extraction_is_idempotent() {
    for (src, name) in [(PYTHON, "a.py"), (JAVA, "A.java"), (GO, "a.go"), (C, "a.c"), (TS, "a.ts")] {
        assert_eq!(extract_file(src, name), extract_file(src, name), "{}", name);
    }
}

#[test]
fn unknown_files_use_indentation_rules() {
    let records = extract(PYTHON, LanguageTag::Unknown);
    assert_eq!(names(&records), ["area", "greet", "scale"]);
    assert_eq!(extract_file("", "notes.txt"), Vec::<FunctionRecord>::new());
}

#[test]
fn records_serialize_with_camel_case_fields() {
    let records = extract_file("def add(a, b):\n    return a + b\n", "m.py");
    let json = serde_json::to_value(&records[0]).expect("json");
    assert_eq!(json["lineStart"], 1);
    assert_eq!(json["lineEnd"], 2);
    assert_eq!(json["language"], "python");
    assert_eq!(json["parameters"][0]["type"], "any");
}
