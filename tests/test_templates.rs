use minitem::value::ValueMap;
use minitem::{compile, context, ErrorKind, Value};
use serde_json::json;
use similar_asserts::assert_eq;

#[test]
fn test_tag_free_template_is_verbatim() {
    let source = "no tags here, just { braces } and %\nnew lines\n";
    let tmpl = compile(source).unwrap();
    assert_eq!(tmpl.render(()).unwrap(), source);
    assert_eq!(tmpl.render(json!({"x": 1})).unwrap(), source);
}

#[test]
fn test_simple_variable() {
    let tmpl = compile("hello {{who}}").unwrap();
    assert_eq!(tmpl.render(json!({"who": "world!"})).unwrap(), "hello world!");
    assert_eq!(tmpl.render(json!({"who": "me"})).unwrap(), "hello me");
}

#[test]
fn test_whitespace_insensitive_tags() {
    let a = compile("hello {{who}}").unwrap();
    let b = compile("hello {{ who }}").unwrap();
    let ctx = json!({"who": "world!"});
    assert_eq!(a.render(&ctx).unwrap(), b.render(&ctx).unwrap());
}

#[test]
fn test_nested_field_access() {
    let tmpl = compile("hello {{person.name}}").unwrap();
    assert_eq!(
        tmpl.render(json!({"person": {"name": "Alex"}})).unwrap(),
        "hello Alex"
    );
    assert_eq!(
        tmpl.render(json!({"person": {}})).unwrap(),
        "hello undefined"
    );
    assert_eq!(tmpl.render(json!({})).unwrap(), "hello undefined");
}

#[test]
fn test_multiple_variables() {
    let tmpl = compile("{{who }} {{hi}} {{ who }}").unwrap();
    assert_eq!(
        tmpl.render(json!({"who": "me", "hi": "hello"})).unwrap(),
        "me hello me"
    );
}

#[test]
fn test_expression_output_is_not_reparsed() {
    let tmpl = compile("{{text}}").unwrap();
    let payload = "{% if cond %} test1 {% else %} test2 {% endif %}";
    assert_eq!(tmpl.render(json!({ "text": payload })).unwrap(), payload);
}

#[test]
fn test_multiline_template() {
    let tmpl = compile("hello {{who}}\nhello {{who}}\nhello {{who}}\n").unwrap();
    assert_eq!(
        tmpl.render(json!({"who": "world!"})).unwrap(),
        "hello world!\nhello world!\nhello world!\n"
    );
}

#[test]
fn test_render_is_pure() {
    let tmpl = compile("{% for x in xs %}{{x}}-{% endfor %}").unwrap();
    let ctx = json!({"xs": [1, 2, 3]});
    let first = tmpl.render(&ctx).unwrap();
    let second = tmpl.render(&ctx).unwrap();
    assert_eq!(first, "1-2-3-");
    assert_eq!(first, second);
}

#[test]
fn test_if_statement() {
    let tmpl = compile("qw {% if condition %} test {% endif %}er").unwrap();
    assert_eq!(tmpl.render(json!({"condition": false})).unwrap(), "qw er");
    assert_eq!(tmpl.render(json!({"condition": true})).unwrap(), "qw  test er");
}

#[test]
fn test_if_else_statement() {
    let tmpl = compile("{% if cond %} test1 {% else %} test2 {% endif %}").unwrap();
    assert_eq!(tmpl.render(json!({"cond": true})).unwrap(), " test1 ");
    assert_eq!(tmpl.render(json!({"cond": false})).unwrap(), " test2 ");
}

#[test]
fn test_else_if_chain_first_truthy_wins() {
    let tmpl = compile("{% if cond1 %}t1{% else if cond2 %}t2{%else%}t3{% endif %}").unwrap();
    assert_eq!(tmpl.render(json!({"cond1": true, "cond2": true})).unwrap(), "t1");
    assert_eq!(tmpl.render(json!({"cond1": false, "cond2": true})).unwrap(), "t2");
    assert_eq!(tmpl.render(json!({"cond1": true, "cond2": false})).unwrap(), "t1");
    assert_eq!(tmpl.render(json!({"cond1": false, "cond2": false})).unwrap(), "t3");
}

#[test]
fn test_truthiness_rule() {
    let tmpl = compile("{% if v %}y{% else %}n{% endif %}").unwrap();
    for falsy in [json!({}), json!({"v": false}), json!({"v": ""}),
                  json!({"v": 0}), json!({"v": []}), json!({"v": {}})] {
        assert_eq!(tmpl.render(&falsy).unwrap(), "n");
    }
    for truthy in [json!({"v": true}), json!({"v": "x"}), json!({"v": -1}),
                   json!({"v": [0]}), json!({"v": {"k": 0}})] {
        assert_eq!(tmpl.render(&truthy).unwrap(), "y");
    }
}

#[test]
fn test_for_over_sequence() {
    let tmpl = compile("{% for item in arr %}test{% endfor %}").unwrap();
    assert_eq!(tmpl.render(json!({"arr": []})).unwrap(), "");
    assert_eq!(tmpl.render(json!({"arr": [1]})).unwrap(), "test");
    assert_eq!(tmpl.render(json!({"arr": [1, 2]})).unwrap(), "testtest");
}

#[test]
fn test_for_over_map() {
    let tmpl = compile("{% for item in arr %}test{% endfor %}").unwrap();
    assert_eq!(tmpl.render(json!({"arr": {}})).unwrap(), "");
    assert_eq!(tmpl.render(json!({"arr": {"a": 1}})).unwrap(), "test");
    assert_eq!(tmpl.render(json!({"arr": {"a": 1, "b": 2}})).unwrap(), "testtest");
}

#[test]
fn test_for_over_map_in_insertion_order() {
    let mut inner = ValueMap::new();
    inner.insert("z".into(), Value::from("first"));
    inner.insert("a".into(), Value::from("second"));
    inner.insert("m".into(), Value::from("third"));
    let tmpl = compile("{% for item in things %}{{item}} {% endfor %}").unwrap();
    assert_eq!(
        tmpl.render(context! { things => Value::from(inner) }).unwrap(),
        "first second third "
    );
}

#[test]
fn test_for_binds_loop_variable() {
    let tmpl = compile("{% for item in arr %}{{item.foo}}{% endfor %}").unwrap();
    assert_eq!(
        tmpl.render(json!({"arr": [{"foo": "test "}, {"foo": "test2"}]}))
            .unwrap(),
        "test test2"
    );
}

#[test]
fn test_loop_index_fields() {
    let ctx = json!({"arr": ["a", "b", "c"]});
    let tmpl = compile("{% for x in arr %}{{loop.index}}{% endfor %}").unwrap();
    assert_eq!(tmpl.render(&ctx).unwrap(), "123");
    let tmpl = compile("{% for x in arr %}{{loop.index0}}{% endfor %}").unwrap();
    assert_eq!(tmpl.render(&ctx).unwrap(), "012");
    let tmpl = compile("{% for x in arr %}{{loop.length}} {% endfor %}").unwrap();
    assert_eq!(tmpl.render(&ctx).unwrap(), "3 3 3 ");
}

#[test]
fn test_loop_index_fields_over_map() {
    let ctx = json!({"arr": {"x": 1, "y": 2}});
    let tmpl = compile("{% for x in arr %}{{loop.index}}{% endfor %}").unwrap();
    assert_eq!(tmpl.render(&ctx).unwrap(), "12");
    let tmpl = compile("{% for x in arr %}{{loop.length}} {% endfor %}").unwrap();
    assert_eq!(tmpl.render(&ctx).unwrap(), "2 2 ");
}

#[test]
fn test_loop_first_and_last() {
    let tmpl =
        compile("{% for x in arr %}{% if loop.first %}first{%else%} not first{%endif%}{% endfor %}")
            .unwrap();
    assert_eq!(tmpl.render(json!({"arr": [1]})).unwrap(), "first");
    assert_eq!(
        tmpl.render(json!({"arr": [1, 2, 3]})).unwrap(),
        "first not first not first"
    );

    let tmpl =
        compile("{% for x in arr %}{% if loop.last %}last{%else%}not last {%endif%}{% endfor %}")
            .unwrap();
    assert_eq!(tmpl.render(json!({"arr": [1]})).unwrap(), "last");
    assert_eq!(
        tmpl.render(json!({"arr": [1, 2, 3]})).unwrap(),
        "not last not last last"
    );
}

#[test]
fn test_loop_parent_reaches_outer_scope() {
    let tmpl = compile("{% for item in arr %}{{item.foo}} {{loop.parent.bar}}{% endfor %}").unwrap();
    assert_eq!(
        tmpl.render(json!({"arr": [{"foo": "test"}], "bar": "b"})).unwrap(),
        "test b"
    );
}

#[test]
fn test_nested_loops() {
    let tmpl = compile(
        "{% for item in arr %}{{item.foo}} {{loop.parent.bar}} \
         {% for item2 in item.n_arr %}{{item2}} {{loop.parent.item.foo}} {% endfor %}\
         {% endfor %}",
    )
    .unwrap();
    assert_eq!(
        tmpl.render(json!({"arr": [{"foo": "test", "n_arr": [4, 6]}], "bar": "b"}))
            .unwrap(),
        "test b 4 test 6 test "
    );
}

#[test]
fn test_nested_loop_parent_loop_state() {
    let tmpl = compile(
        "{% for outer in arr %}{% for inner in outer %}\
         {{loop.parent.loop.index}}.{{loop.index}} {% endfor %}{% endfor %}",
    )
    .unwrap();
    assert_eq!(
        tmpl.render(json!({"arr": [[1, 2], [3]]})).unwrap(),
        "1.1 1.2 2.1 "
    );
}

#[test]
fn test_default_filter() {
    let tmpl = compile("hello {{who|default('Value not set')}}").unwrap();
    assert_eq!(tmpl.render(json!({})).unwrap(), "hello Value not set");
    assert_eq!(tmpl.render(json!({"who": "value"})).unwrap(), "hello value");
}

#[test]
fn test_string_capability_filters() {
    let tmpl = compile("hello {{who|repeat(2)}}").unwrap();
    assert_eq!(tmpl.render(json!({"who": "value"})).unwrap(), "hello valuevalue");

    let tmpl = compile("{{ name | trim | toLowerCase }}").unwrap();
    assert_eq!(tmpl.render(json!({"name": "  BOB "})).unwrap(), "bob");
}

#[test]
fn test_sequence_capability_filters() {
    let tmpl = compile("hello {{who|join(',')}}").unwrap();
    assert_eq!(
        tmpl.render(json!({"who": ["qw", "er"]})).unwrap(),
        "hello qw,er"
    );
}

#[test]
fn test_filter_chain_left_to_right() {
    let tmpl = compile("{{arr|join(',')|repeat(2)}}").unwrap();
    assert_eq!(
        tmpl.render(json!({"arr": ["qw", "er"]})).unwrap(),
        "qw,erqw,er"
    );

    let tmpl = compile("{{ arr | join(',') | toUpperCase }}").unwrap();
    assert_eq!(tmpl.render(json!({"arr": ["qw", "er"]})).unwrap(), "QW,ER");
}

#[test]
fn test_unknown_filter_fails_the_render() {
    let tmpl = compile("hello {{who|qwe}}").unwrap();
    let err = tmpl.render(json!({"who": ["qw", "er"]})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFilter);
    assert_eq!(err.to_string(), "who.qwe is not a function");
    assert_eq!(err.line(), Some(1));

    let tmpl = compile("hello {{who|qwe(5)}}").unwrap();
    let err = tmpl.render(json!({"who": ["qw", "er"]})).unwrap_err();
    assert_eq!(err.to_string(), "who.qwe is not a function");
}

#[test]
fn test_unknown_filter_reports_tag_line() {
    let tmpl = compile("line one\nline two\nhello {{who|qwe}}").unwrap();
    let err = tmpl.render(json!({"who": "x"})).unwrap_err();
    assert_eq!(err.line(), Some(3));
}

#[test]
fn test_unknown_filter_diagnostic_on_stderr() {
    // re-executed as a child process so the diagnostic can be captured
    if std::env::var_os("RUN_DIAGNOSTIC_CHILD").is_some() {
        let tmpl = compile("hello {{who|qwe}}").unwrap();
        let _ = tmpl.render(json!({"who": "x"}));
        // a chained failure still produces a single line
        let tmpl = compile("{{who|default('x')|qwe}}").unwrap();
        let _ = tmpl.render(json!({"who": "y"}));
        return;
    }
    let output = std::process::Command::new(std::env::current_exe().unwrap())
        .args([
            "--exact",
            "test_unknown_filter_diagnostic_on_stderr",
            "--nocapture",
        ])
        .env("RUN_DIAGNOSTIC_CHILD", "1")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let diagnostics: Vec<&str> = stderr
        .lines()
        .filter(|line| line.starts_with("Line:"))
        .collect();
    assert_eq!(
        diagnostics,
        vec![
            "Line: 1; Error in {{who|qwe}}",
            "Line: 1; Error in {{who|default('x')|qwe}}",
        ]
    );
}

#[test]
fn test_template_survives_failed_render() {
    let tmpl = compile("{{who|default('x')|qwe}}").unwrap();
    assert!(tmpl.render(json!({"who": "y"})).is_err());
    // a failed call must not poison the compiled template
    let tmpl2 = compile("{{who}}").unwrap();
    assert_eq!(tmpl2.render(json!({"who": "y"})).unwrap(), "y");
    assert!(tmpl.render(json!({"who": "z"})).is_err());
}

#[test]
fn test_capability_filters_are_type_bound() {
    // string operations do not apply to numbers
    let tmpl = compile("{{n|repeat(2)}}").unwrap();
    let err = tmpl.render(json!({"n": 42})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFilter);
    assert_eq!(err.to_string(), "n.repeat is not a function");

    // sequence operations do not apply to strings
    let tmpl = compile("{{s|join(',')}}").unwrap();
    let err = tmpl.render(json!({"s": "abc"})).unwrap_err();
    assert_eq!(err.to_string(), "s.join is not a function");
}

#[test]
fn test_context_macro() {
    let tmpl = compile("{{ user.name }} has {{ count }} items").unwrap();
    let rv = tmpl
        .render(context! {
            user => context! { name => "Peter" },
            count => 3,
        })
        .unwrap();
    assert_eq!(rv, "Peter has 3 items");
}

#[test]
fn test_render_to_write() {
    let tmpl = compile("hello {{who}}").unwrap();
    let mut out = Vec::new();
    tmpl.render_to_write(json!({"who": "stream"}), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "hello stream");
}

#[test]
fn test_concurrent_renders() {
    let tmpl = std::sync::Arc::new(
        compile("{% for x in xs %}{{x}}{% endfor %}").unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tmpl = tmpl.clone();
            std::thread::spawn(move || tmpl.render(json!({"xs": [1, 2, 3]})).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "123");
    }
}
