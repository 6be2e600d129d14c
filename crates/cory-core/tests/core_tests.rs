use cory_core::{
    Error, ExitsFlags, Item, LevelDataDocument, RecursiveMap, ScreenField, ScreenRecord,
    TrackedList, TrackedMap, get_pointer, remove_pointer, set_pointer,
};
use serde_json::{Map, Value, json};

fn obj(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        other => panic!("not an object: {}", other),
    }
}

#[test]
fn tracked_map_guards_writes() {
    let mut ro: TrackedMap<i32> = TrackedMap::new(false, [("a".to_string(), 1)].into_iter().collect());
    assert_eq!(*ro.get("a").unwrap(), 1);
    assert!(matches!(ro.get("zz"), Err(Error::NotFound(_))));
    assert!(matches!(ro.insert("b", 2), Err(Error::WriteProtected { .. })));
    assert!(matches!(ro.remove("a"), Err(Error::WriteProtected { .. })));
    assert!(!ro.is_dirty());
    assert_eq!(ro.len(), 1);

    let mut rw: TrackedMap<i32> = TrackedMap::new(true, Default::default());
    assert!(!rw.is_dirty());
    rw.insert("b", 2).unwrap();
    assert!(rw.is_dirty());
    assert!(matches!(rw.remove("nope"), Err(Error::NotFound(_))));
}

#[test]
fn tracked_list_marks_dirty_on_mutation() {
    let mut list = TrackedList::new(true, vec![1, 2, 3]);
    assert!(!list.is_dirty());
    assert_eq!(*list.get(1).unwrap(), 2);
    assert!(matches!(list.get(9), Err(Error::IndexOutOfRange(_))));
    assert!(!list.is_dirty());
    list.push(4).unwrap();
    assert!(list.is_dirty());
    assert!(matches!(list.remove(10), Err(Error::IndexOutOfRange(_))));
    assert_eq!(list.remove(0).unwrap(), 1);
    assert_eq!(list.into_inner(), vec![2, 3, 4]);

    let mut ro = TrackedList::new(false, vec!["x"]);
    assert!(matches!(ro.set(0, "y"), Err(Error::WriteProtected { .. })));
    assert!(matches!(ro.extend(["z"]), Err(Error::WriteProtected { .. })));
    assert!(!ro.is_dirty());
}

#[test]
fn nested_write_dirties_root_at_any_depth() {
    let mut root = RecursiveMap::new(
        true,
        obj(json!({"a": {"b": [{"c": 1}, {"c": 2}]}, "z": 0})),
    );
    assert!(!root.is_dirty());
    root.map("a")
        .unwrap()
        .list("b")
        .unwrap()
        .map(1)
        .unwrap()
        .set("c", 3)
        .unwrap();
    assert!(root.is_dirty());
    assert_eq!(
        root.to_value(),
        json!({"a": {"b": [{"c": 1}, {"c": 3}]}, "z": 0})
    );
}

#[test]
fn reading_nested_values_does_not_dirty() {
    let mut root = RecursiveMap::new(true, obj(json!({"a": {"b": [1, 2]}, "n": 5})));
    let b = root.map("a").unwrap().list("b").unwrap();
    assert_eq!(b.len(), 2);
    assert_eq!(*b.value(0).unwrap(), json!(1));
    assert_eq!(*root.value("n").unwrap(), json!(5));
    assert!(!root.is_dirty());
    assert!(matches!(root.map("n"), Err(Error::WrongKind { .. })));
    assert!(matches!(root.value("a"), Err(Error::WrongKind { .. })));
}

#[test]
fn read_only_nested_containers_refuse_writes() {
    let original = json!({"a": {"b": [1, 2]}});
    let mut root = RecursiveMap::new(false, obj(original.clone()));
    let inner = root.map("a").unwrap();
    assert!(!inner.is_writable());
    assert!(matches!(inner.set("x", 1), Err(Error::WriteProtected { .. })));
    assert!(matches!(
        inner.list("b").unwrap().push(3),
        Err(Error::WriteProtected { .. })
    ));
    assert!(!root.is_dirty());
    assert_eq!(root.to_value(), original);
}

#[test]
fn promoted_child_is_reused() {
    let mut root = RecursiveMap::new(true, obj(json!({"a": {"k": 1}})));
    root.map("a").unwrap().set("k", 2).unwrap();
    // Second access sees the first access's write: same wrapped instance.
    match root.get("a").unwrap() {
        Item::Map(m) => assert_eq!(m.peek("k"), Some(json!(2))),
        other => panic!("expected map, got {:?}", other),
    }
    assert!(root.is_dirty());
}

#[test]
fn replacing_a_value_stores_it_raw_until_read() {
    let mut root = RecursiveMap::new(true, obj(json!({})));
    root.set("fresh", json!({"inner": [1]})).unwrap();
    assert!(root.is_dirty());
    root.map("fresh").unwrap().list("inner").unwrap().push(2).unwrap();
    assert_eq!(root.into_value(), json!({"fresh": {"inner": [1, 2]}}));
}

#[test]
fn pointer_edits_go_through_tracking() {
    let mut root = RecursiveMap::new(
        true,
        obj(json!({"decor": {"lamp": {"x": 1}, "a/b": 0}, "list": [1, 2]})),
    );
    assert_eq!(get_pointer(&root, "/decor/lamp/x"), Some(json!(1)));
    assert_eq!(get_pointer(&root, "/decor/a~1b"), Some(json!(0)));
    assert_eq!(get_pointer(&root, "/list/1"), Some(json!(2)));
    assert_eq!(get_pointer(&root, "/missing"), None);
    assert!(!root.is_dirty());

    set_pointer(&mut root, "/decor/lamp/x", json!(42)).unwrap();
    assert!(root.is_dirty());
    set_pointer(&mut root, "/list/-", json!(3)).unwrap();
    assert_eq!(
        remove_pointer(&mut root, "/decor/a~1b").unwrap(),
        json!(0)
    );
    assert_eq!(
        root.to_value(),
        json!({"decor": {"lamp": {"x": 42}}, "list": [1, 2, 3]})
    );
    assert!(matches!(
        set_pointer(&mut root, "/list/0/deeper", json!(1)),
        Err(Error::WrongKind { .. })
    ));
}

#[test]
fn exits_parse_and_detect_changes() {
    let mut e = ExitsFlags::parse("1010").unwrap();
    assert!(e.down && !e.up && e.left && !e.right);
    assert!(!e.is_dirty());
    e.up = true;
    assert!(e.is_dirty());
    assert_eq!(e.to_string(), "1110");
    e.up = false;
    assert!(!e.is_dirty());

    let d = ExitsFlags::default();
    assert_eq!(d.to_string(), "1111");
    assert!(matches!(ExitsFlags::parse("10"), Err(Error::DataIntegrity(_))));
    assert!(matches!(ExitsFlags::parse("1x11"), Err(Error::DataIntegrity(_))));
}

fn screen_json() -> Value {
    json!({
        "geo": "abc",
        "ambiance": "forest",
        "palette": "3",
        "title": "Luncheon",
        "area": "0",
        "transition": 2,
        "music": "home",
        "object_id": 17,
        "name": "start",
        "exits": "1101",
        "objects": [{"obj": "tree", "x": 10, "y": 20}],
        "decos": [],
        "custom": {"kept": true}
    })
}

#[test]
fn screen_fields_read_and_coerce() {
    let mut s = ScreenRecord::new(true, obj(screen_json())).unwrap();
    assert_eq!(s.geo(), Some("abc"));
    assert_eq!(s.ambiance(), Some("forest"));
    assert_eq!(s.palette(), Some("3"));
    assert_eq!(s.title(), Some("Luncheon"));
    assert_eq!(s.area(), Some("0"));
    assert_eq!(s.transition(), Some(2));
    assert_eq!(s.music(), Some("home"));
    assert_eq!(s.object_id().unwrap(), 17);
    assert_eq!(s.name(), Some("start"));
    assert!(s.exits().down && s.exits().up && !s.exits().left && s.exits().right);
    assert!(!s.is_dirty());

    s.set_field(ScreenField::Palette, json!(5)).unwrap();
    assert_eq!(s.palette(), Some("5"));
    s.set_field(ScreenField::Transition, json!("4")).unwrap();
    assert_eq!(s.transition(), Some(4));
    assert!(matches!(
        s.set_field(ScreenField::ObjectId, json!("tree")),
        Err(Error::WrongKind { .. })
    ));
    assert!(matches!(
        s.set_field(ScreenField::Title, json!([1])),
        Err(Error::WrongKind { .. })
    ));
    assert!(s.is_dirty());
    assert_eq!("object_id".parse::<ScreenField>().unwrap(), ScreenField::ObjectId);
}

#[test]
fn exits_accept_numeric_digits() {
    let mut s = ScreenRecord::new(true, obj(screen_json())).unwrap();
    // A CLI value of 1010 parses as a JSON number.
    s.set_field(ScreenField::Exits, json!(1010)).unwrap();
    assert_eq!(s.exits().to_string(), "1010");
    assert!(s.exits().down && !s.exits().up && s.exits().left && !s.exits().right);
    s.set_field(ScreenField::Exits, json!("0011")).unwrap();
    assert_eq!(s.field(ScreenField::Exits), Some(json!("0011")));

    assert!(matches!(
        s.set_field(ScreenField::Exits, json!(1210)),
        Err(Error::DataIntegrity(_))
    ));
    assert!(matches!(
        s.set_field(ScreenField::Exits, json!(11)),
        Err(Error::DataIntegrity(_))
    ));
    assert!(matches!(
        s.set_field(ScreenField::Exits, json!(-1010)),
        Err(Error::WrongKind { .. })
    ));
    assert!(matches!(
        s.set_field(ScreenField::Exits, json!(true)),
        Err(Error::WrongKind { .. })
    ));
    assert_eq!(s.exits().to_string(), "0011");
}

#[test]
fn integer_fields_reject_out_of_range_floats() {
    let mut s = ScreenRecord::new(true, obj(screen_json())).unwrap();
    for v in [json!(1e20), json!(-1e20), json!(9.3e18)] {
        assert!(matches!(
            s.set_field(ScreenField::Transition, v),
            Err(Error::WrongKind { .. })
        ));
    }
    assert!(matches!(
        s.set_field(ScreenField::ObjectId, json!(2.5)),
        Err(Error::WrongKind { .. })
    ));
    assert_eq!(s.transition(), Some(2));
    assert!(!s.is_dirty());

    s.set_field(ScreenField::Transition, json!(3.0)).unwrap();
    assert_eq!(s.transition(), Some(3));
    s.set_field(ScreenField::ObjectId, json!(-4e3)).unwrap();
    assert_eq!(s.object_id().unwrap(), -4000);
}

#[test]
fn screen_missing_fields() {
    let s = ScreenRecord::new(false, obj(json!({"geo": "g"}))).unwrap();
    assert_eq!(s.title(), None);
    assert_eq!(s.transition(), None);
    assert!(matches!(s.object_id(), Err(Error::DataIntegrity(_))));
    assert_eq!(s.exits().to_string(), "1111");
    assert!(ScreenRecord::new(false, obj(json!({"exits": 1111}))).is_err());
}

#[test]
fn read_only_screen_refuses_every_setter() {
    let mut s = ScreenRecord::new(false, obj(screen_json())).unwrap();
    assert!(matches!(s.set_geo("x"), Err(Error::WriteProtected { .. })));
    assert!(matches!(s.set_object_id(1), Err(Error::WriteProtected { .. })));
    assert!(matches!(s.exits_mut(), Err(Error::WriteProtected { .. })));
    assert!(matches!(
        s.objects().map(0).unwrap().set("x", 0),
        Err(Error::WriteProtected { .. })
    ));
    assert!(!s.is_dirty());
    assert_eq!(Value::Object(s.into_raw()), screen_json());
}

#[test]
fn screen_folds_only_changed_parts() {
    let mut s = ScreenRecord::new(true, obj(screen_json())).unwrap();
    s.objects().map(0).unwrap().set("x", 99).unwrap();
    assert!(s.is_dirty());
    s.exits_mut().unwrap().left = true;
    s.decos().push(json!({"deco": "rock", "x": 1, "y": 2})).unwrap();

    let raw = Value::Object(s.to_serializable().clone());
    assert_eq!(raw["objects"][0]["x"], json!(99));
    assert_eq!(raw["exits"], json!("1111"));
    assert_eq!(raw["decos"], json!([{"deco": "rock", "x": 1, "y": 2}]));
    assert_eq!(raw["custom"], json!({"kept": true}));
    assert_eq!(raw["geo"], json!("abc"));
}

#[test]
fn level_data_promotes_once() {
    let root = json!({"0_0_0": screen_json(), "0_1_2": {"geo": "other", "object_id": 3}});
    let mut doc = LevelDataDocument::new(root, true).unwrap();
    let first: *const ScreenRecord = doc.get("0_0_0").unwrap();
    let second: *const ScreenRecord = doc.get("0_0_0").unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(!doc.is_dirty());

    doc.get("0_0_0").unwrap().set_geo("changed").unwrap();
    assert_eq!(doc.get("0_0_0").unwrap().geo(), Some("changed"));
    assert!(doc.is_dirty());
    assert!(matches!(doc.get("9_9_9"), Err(Error::NotFound(_))));
}

#[test]
fn level_data_set_requires_objects() {
    let mut doc = LevelDataDocument::new(json!({"0_0_0": {"object_id": 1}}), true).unwrap();
    assert!(matches!(
        doc.set("0_0_1", json!("nope")),
        Err(Error::WrongKind { .. })
    ));
    assert!(!doc.is_dirty());
    doc.set("0_0_1", json!({"geo": "new", "object_id": 2})).unwrap();
    assert!(doc.is_dirty());
    assert_eq!(doc.get("0_0_1").unwrap().object_id().unwrap(), 2);

    let mut ro = LevelDataDocument::new(json!({"0_0_0": {"object_id": 1}}), false).unwrap();
    assert!(matches!(
        ro.set("0_0_1", json!({})),
        Err(Error::WriteProtected { .. })
    ));
    assert!(LevelDataDocument::new(json!([1, 2]), false).is_err());
}

#[test]
fn level_data_remove_drops_screens() {
    let root = json!({"0_0_0": {"object_id": 1}, "0_0_1": {"object_id": 2}});
    let mut doc = LevelDataDocument::new(root.clone(), true).unwrap();
    assert!(matches!(doc.remove("9_9_9"), Err(Error::NotFound(_))));
    assert!(!doc.is_dirty());

    doc.get("0_0_0").unwrap();
    doc.remove("0_0_0").unwrap();
    assert!(doc.is_dirty());
    assert!(!doc.contains_key("0_0_0"));
    assert_eq!(doc.len(), 1);
    assert!(matches!(doc.get("0_0_0"), Err(Error::NotFound(_))));
    assert_eq!(doc.serialize().unwrap(), r#"{"0_0_1":{"object_id":2}}"#);

    let mut ro = LevelDataDocument::new(root, false).unwrap();
    assert!(matches!(
        ro.remove("0_0_0"),
        Err(Error::WriteProtected { .. })
    ));
    assert_eq!(ro.len(), 2);
}

#[test]
fn level_data_serializes_compact_in_input_order() {
    let text = r#"{"b_0_0": {"geo": "x", "object_id": 1, "extra": [1, 2]}, "a_0_0": {"geo": "y", "object_id": 2}}"#;
    let mut doc = LevelDataDocument::from_json(text, true).unwrap();
    assert!(!doc.is_dirty());
    // Reading a screen alone leaves the document clean.
    assert_eq!(doc.get("a_0_0").unwrap().geo(), Some("y"));
    assert!(!doc.is_dirty());
    doc.get("b_0_0").unwrap().set_geo("z").unwrap();
    assert_eq!(
        doc.serialize().unwrap(),
        r#"{"b_0_0":{"geo":"z","object_id":1,"extra":[1,2]},"a_0_0":{"geo":"y","object_id":2}}"#
    );
    assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b_0_0", "a_0_0"]);
}
