extern crate tinytemplate;
use tinytemplate::{
    Bundle, Error, JsonValue, Locale, MapBundle, Options, TemplateModel, TemplateProcessor, Value
};

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::Cursor;
use std::rc::Rc;


fn process(model: &TemplateModel) -> String {
    TemplateProcessor::builder()
        .without_logger()
        .build()
        .process(model)
        .unwrap()
}

fn lenient(model: &TemplateModel) -> String {
    TemplateProcessor::builder()
        .without_logger()
        .with_options(Options::lenient())
        .build()
        .process(model)
        .unwrap()
}

fn rows(content: &str, name: &str, values: &[&str]) -> Vec<TemplateModel> {
    values.iter()
        .map(|value| TemplateModel::of_content(content).variable(name, *value))
        .collect()
}


#[test]
fn list_rows_get_position() {
    let model = TemplateModel::of_content(
        "<ul><t:list rows><li>${_number}/${_size} ${name}\
         <t:if _first> first</t:if><t:if _last> last</t:if><t:if _odd> odd</t:if></li></t:list></ul>"
    )
        .list("rows", |content| rows(content, "name", &["a", "b", "c"]));
    assert_eq!(
        process(&model),
        "<ul><li>1/3 a first</li><li>2/3 b odd</li><li>3/3 c last</li></ul>"
    );
}

#[test]
fn list_index_and_even() {
    let model = TemplateModel::of_content("<t:list rows>${_index}${_even:+e}${_odd:+o} </t:list>")
        .list("rows", |content| rows(content, "name", &["a", "b", "c", "d"]));
    assert_eq!(process(&model), "0e 1o 2e 3o ");
}

#[test]
fn nested_lists() {
    let model = TemplateModel::of_content(
        "<t:list groups>[${group}:<t:list items>${item}${_last:=,}</t:list>]</t:list>"
    )
        .list("groups", |content| vec![
            TemplateModel::of_content(content)
                .variable("group", "x")
                .list("items", |content| rows(content, "item", &["1", "2"])),
            TemplateModel::of_content(content)
                .variable("group", "y")
                .list("items", |content| rows(content, "item", &["3"])),
        ]);
    assert_eq!(process(&model), "[x:1,2][y:3]");
}

#[test]
fn rows_see_enclosing_scope() {
    let model = TemplateModel::of_content("<t:list rows>${title}-${name}<t:if shown>!</t:if> </t:list>")
        .variable("title", "T")
        .condition("shown", true)
        .list("rows", |content| rows(content, "name", &["a", "b"]));
    assert_eq!(process(&model), "T-a! T-b! ");
}

#[test]
fn empty_list() {
    let model = TemplateModel::of_content("<t:list none>never</t:list>|<t:if none>rows<t:else/>empty</t:if>")
        .list_of("none", vec![]);
    assert_eq!(process(&model), "|empty");
}

#[test]
fn list_rows_keep_escapes() {
    let model = TemplateModel::of_content(r"<t:list rows>\${name}=${name} </t:list>")
        .list("rows", |content| rows(content, "name", &["a"]));
    assert_eq!(process(&model), "${name}=a ");
}

#[test]
fn list_from_json() {
    let data = serde_json::from_str::<JsonValue>(r#"{
        "people": [ { "name": "Ann" }, { "name": "Bob" } ]
    }"#).unwrap();
    let people = data["people"].as_array().cloned().unwrap_or_default();
    let model = TemplateModel::of_content("<t:list people>${name};</t:list>")
        .list("people", move |content| {
            people.iter()
                .map(|person| TemplateModel::of_content(content).variables(person.clone()))
                .collect()
        });
    assert_eq!(process(&model), "Ann;Bob;");
}

#[test]
fn object_inherits_enclosing_scope() {
    let model = TemplateModel::of_content(
        "<t:object person><p>${name} works at ${company}</p></t:object>"
    )
        .variable("company", "Acme")
        .object("person", |content| TemplateModel::of_content(content).variable("name", "Ann"));
    assert_eq!(process(&model), "<p>Ann works at Acme</p>");
}

#[test]
fn object_shadows_enclosing_scope() {
    let model = TemplateModel::of_content("${name}<t:object person>/${name}</t:object>/${name}")
        .variable("name", "outer")
        .object("person", |content| TemplateModel::of_content(content).variable("name", "inner"));
    assert_eq!(process(&model), "outer/inner/outer");
}

#[test]
fn object_is_a_condition() {
    let model = TemplateModel::of_content("<t:if person>has<t:else/>none</t:if>")
        .object("person", |content| TemplateModel::of_content(content));
    assert_eq!(process(&model), "has");
}

#[test]
fn include_is_isolated() {
    let model = TemplateModel::of_content("<t:if flag>${name}</t:if>:<t:include part/>")
        .variable("name", "Ann")
        .condition("flag", true)
        .include("part", TemplateModel::of_content("<t:if flag>${name}<t:else/>alone</t:if>"));
    assert_eq!(process(&model), "Ann:alone");
}

#[test]
fn include_from_reader_twice() {
    let part = TemplateModel::of_reader(Cursor::new(b"<b>${name:-x}</b>".to_vec()));
    let model = TemplateModel::of_content("<t:include part/>+<t:include part/>")
        .include("part", part.clone());
    assert_eq!(process(&model), "<b>x</b>+<b>x</b>");
    assert_eq!(process(&part), "<b>x</b>");
}

#[test]
fn include_is_computed_on_use() {
    let count = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&count);
    let model = TemplateModel::of_content("<t:include part/><t:include part/>")
        .include_with("part", move || {
            *counter.borrow_mut() += 1;
            TemplateModel::of_content("${count}").variable("count", *counter.borrow())
        });
    assert_eq!(process(&model), "12");
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn three_level_conditions() {
    let text = "<t:if a1><t:if b1><t:if c1>1<t:else/>2</t:if><t:else/>\
                <t:if c1>3<t:else/>4</t:if></t:if><t:else/><t:if b1>5<t:else/>6</t:if></t:if>";
    let mut outcomes = HashSet::new();
    for bits in 0..8 {
        let (a, b, c) = (bits & 4 != 0, bits & 2 != 0, bits & 1 != 0);
        let model = TemplateModel::of_content(text)
            .condition("a1", a)
            .condition("b1", b)
            .condition("c1", c);
        let expected = match (a, b, c) {
            (true, true, true) => "1",
            (true, true, false) => "2",
            (true, false, true) => "3",
            (true, false, false) => "4",
            (false, true, _) => "5",
            (false, false, _) => "6",
        };
        let result = process(&model);
        assert_eq!(result, expected, "a={} b={} c={}", a, b, c);
        outcomes.insert(result);
    }
    assert_eq!(outcomes.len(), 6);
}

#[test]
fn ternary_matches_if_else() {
    let values = [
        Value::from(true), Value::from(false), Value::from(""), Value::from("0"),
        Value::from("False"), Value::from("text"), Value::from(0), Value::from(3),
        Value::from(0.0), Value::Null,
    ];
    for value in values {
        let ternary = TemplateModel::of_content("${flag:?A:B}").variable("flag", value.clone());
        let block = TemplateModel::of_content("<t:if flag>A<t:else/>B</t:if>").variable("flag", value.clone());
        assert_eq!(process(&ternary), process(&block), "{:?}", value);
    }
}

#[test]
fn default_and_alternative_are_complementary() {
    for value in [Value::from("x"), Value::from(""), Value::from(false), Value::from(1)] {
        let model = TemplateModel::of_content("${val:-D}|${val:+A}").variable("val", value.clone());
        let result = process(&model);
        let (minus, plus) = result.split_once('|').unwrap();
        assert!((minus == "D") != (plus == "A"), "{:?} gave {}", value, result);
    }
}

#[test]
fn reset_discards_output() {
    let model = TemplateModel::of_content("Before<t:instruct reset/>After");
    assert_eq!(process(&model), "After");

    let model = TemplateModel::of_content("A<t:if on>B<t:instruct reset/>C</t:if>D")
        .condition("on", true);
    assert_eq!(process(&model), "CD");

    let model = TemplateModel::of_content("A<t:instruct reset>B");
    assert_eq!(process(&model), "B");
}

#[test]
fn reset_in_skipped_branch_is_ignored() {
    let model = TemplateModel::of_content("A<t:if on><t:instruct reset/>B</t:if>C")
        .condition("on", false);
    assert_eq!(process(&model), "AC");
}

#[test]
fn end_stops_output() {
    let model = TemplateModel::of_content("A<t:instruct end/>B<t:if on>C</t:if>")
        .condition("on", true);
    assert_eq!(process(&model), "A");

    let model = TemplateModel::of_content("A<t:if on>B<t:instruct end/>C</t:if>D")
        .condition("on", true);
    assert_eq!(process(&model), "AB");
}

#[test]
fn end_in_include_stays_there() {
    let model = TemplateModel::of_content("<t:include part/>z")
        .include("part", TemplateModel::of_content("x<t:instruct end/>y"));
    assert_eq!(process(&model), "xz");
}

#[test]
fn custom_instruction() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&seen);
    let model = TemplateModel::of_content("a<t:instruct flush/>b<t:instruct page-break/>")
        .instruction(move |name| recorder.borrow_mut().push(name.to_owned()));
    assert_eq!(process(&model), "ab");
    assert_eq!(*seen.borrow(), vec!["flush".to_owned(), "page-break".to_owned()]);
}

#[test]
fn missing_variable_fails() {
    let model = TemplateModel::of_content("<p>${NAME}</p>");
    let result = TemplateProcessor::builder().without_logger().build().process(&model);
    assert!(matches!(result, Err(Error::MissingVariable(name)) if name == "NAME"));
    assert_eq!(lenient(&model), "<p></p>");
}

#[test]
fn missing_blocks_fail() {
    let processor = TemplateProcessor::builder().without_logger().build();
    let include = processor.process(&TemplateModel::of_content("<t:include part/>"));
    assert!(matches!(include, Err(Error::MissingInclude(name)) if name == "part"));
    let list = processor.process(&TemplateModel::of_content("<t:list rows>x</t:list>"));
    assert!(matches!(list, Err(Error::MissingList(name)) if name == "rows"));
    let object = processor.process(&TemplateModel::of_content("<t:object person>x</t:object>"));
    assert!(matches!(object, Err(Error::MissingObject(name)) if name == "person"));
}

#[test]
fn missing_condition_policy() {
    let model = TemplateModel::of_content("<t:if unknown>x<t:else/>y</t:if>");
    assert_eq!(process(&model), "y");
    let strict = TemplateProcessor::builder()
        .without_logger()
        .with_missing_condition_throws(true)
        .build();
    assert!(matches!(strict.process(&model), Err(Error::MissingCondition(name)) if name == "unknown"));
}

#[test]
fn missing_condition_in_operators_is_false() {
    let strict = TemplateProcessor::builder()
        .without_logger()
        .with_missing_condition_throws(true)
        .build();
    let model = TemplateModel::of_content("${unknown:?yes:no}/${unknown:+set}/${unknown:-fallback}");
    assert_eq!(strict.process(&model).unwrap(), "no//fallback");
}

#[test]
fn missing_object_passes_through() {
    let model = TemplateModel::of_content(
        "<html>\n<body>\n<t:object aTemplate>\n<p>Name: ${name}</p>\n</t:object>\n</body>\n</html>\n"
    );
    assert_eq!(
        lenient(&model),
        "<html>\n<body>\n<t:object aTemplate>\n<p>Name: </p>\n</t:object>\n</body>\n</html>\n"
    );
}

#[test]
fn missing_list_inside_condition_keeps_nesting() {
    let model = TemplateModel::of_content("<t:if on><t:list nothing>x</t:list>y<t:else/>z</t:if>!")
        .condition("on", true);
    assert_eq!(lenient(&model), "<t:list nothing>x</t:list>y!");
}

#[test]
fn ignore_keeps_markers_and_tags() {
    let model = TemplateModel::of_content(r"<t:ignore>${x} \${y} <t:list z></t:list></t:ignore>");
    assert_eq!(process(&model), "${x} ${y} <t:list z></t:list>");
}

#[test]
fn ignore_drops_escapes() {
    let model = TemplateModel::of_content(r"<t:ignore>\</t:ignore> and \${x}</t:ignore>!");
    assert_eq!(process(&model), "</t:ignore> and ${x}!");
}

#[test]
fn ignore_inside_list_drops_escapes() {
    let model = TemplateModel::of_content(r"<t:list rows><t:ignore>\${name}</t:ignore>=${name};</t:list>")
        .list("rows", |content| rows(content, "name", &["ab", "cd"]));
    assert_eq!(process(&model), "${name}=ab;${name}=cd;");
}

#[test]
fn missing_include_emits_nothing() {
    let model = TemplateModel::of_content("a<t:include nothing/>b");
    assert_eq!(lenient(&model), "ab");
    assert!(matches!(
        TemplateProcessor::builder().without_logger().build().process(&model),
        Err(Error::MissingInclude(name)) if name == "nothing"
    ));
}

#[test]
fn unterminated_block_ends_with_input() {
    let model = TemplateModel::of_content("a<t:if on>b")
        .condition("on", true);
    assert_eq!(process(&model), "ab");
    let model = TemplateModel::of_content("a<t:if on>b")
        .condition("on", false);
    assert_eq!(process(&model), "a");
}

#[test]
fn bundles_by_locale() {
    let model = TemplateModel::of_content("${%hello}")
        .locale(Locale::new("fr_FR"))
        .bundle_with(|locale| -> Rc<dyn Bundle> {
            let text = if locale.language() == "fr" { "Bonjour" } else { "Hello" };
            Rc::new(MapBundle::new().with("hello", text))
        });
    assert_eq!(process(&model), "Bonjour");
    assert_eq!(process(&model.clone().locale(Locale::new("en_GB"))), "Hello");
}

#[test]
fn rows_use_enclosing_bundles() {
    let model = TemplateModel::of_content("<t:list rows>${%greet ${name}} </t:list>")
        .bundle(MapBundle::from_properties("greet=Hi {0}"))
        .list("rows", |content| rows(content, "name", &["Ann", "Bob"]));
    assert_eq!(process(&model), "Hi Ann Hi Bob ");
}

#[test]
fn i18n_variable() {
    let model = TemplateModel::of_content("<h1>${title}</h1>")
        .bundle(MapBundle::new().with("greet", "{0}, hello"))
        .i18n("title", "greet", &["Ann"]);
    assert_eq!(process(&model), "<h1>Ann, hello</h1>");
}

#[test]
fn options_from_yaml() {
    let options = Options::from_yaml("missing-variable-throws: false\nnulls-are-empty: false").unwrap();
    let processor = TemplateProcessor::builder().without_logger().with_options(options).build();
    assert!(!processor.options().nulls_are_empty);
    let model = TemplateModel::of_content("[${nothing}]");
    assert_eq!(processor.process(&model).unwrap(), "[null]");
}
