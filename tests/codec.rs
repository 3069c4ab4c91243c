//! Tests for the frame codec: ops, cursors and frames through the public API.

use ronframe::Error;
use ronframe::ron::Cursor;
use ronframe::ron::Frame;
use ronframe::ron::Op;
use ronframe::ron::Position;
use ronframe::ron::Term;
use ronframe::ron::Uuid;
use ronframe::ron::Value;
use ronframe::ron::slice;
use ronframe::stream;

// =============================================================================
// Helper functions
// =============================================================================

fn uuid(text: &str) -> Uuid {
    return text.parse().unwrap();
}

fn op(kind: &str, object: &str, event: &str, location: &str, values: &str, term: Term) -> Op<'static> {
    return Op::new(uuid(kind), uuid(object), uuid(event), uuid(location), values.to_string(), term);
}

fn roundtrip(op: &Op<'_>, ctx: &Op<'_>) {
    let text = op.serialize(ctx);
    let (parsed, len) = Op::parse(&text, ctx, 0).unwrap().unwrap();
    assert_eq!(&parsed, op, "{text:?}");
    assert_eq!(len, text.len(), "{text:?}");
}

// =============================================================================
// Op round trips
// =============================================================================

#[test]
fn ops_roundtrip_against_their_context() {
    let header = op("lww", "mice", "1ABC+gritzko", "0", "", Term::Header);
    let ops = [
        op("lww", "mice", "1ABC+gritzko", "x", "=1", Term::Regular),
        op("lww", "mice", "1ABD+gritzko", "x", "'one'", Term::Regular),
        op("lww", "mice", "1ABC+alice", "y", "^2.5", Term::Continuation),
        op("lww", "cats", "1ABC+gritzko", "0", "", Term::Query),
        op("lww", "mice", "1ABC+gritzko", "0", ">true>false>0", Term::Header),
        op("lww", "mice", "1ABC+gritzko", "0", "", Term::Regular),
    ];
    for op in &ops {
        roundtrip(op, &header);
        roundtrip(op, &Op::ZERO);
        for ctx in &ops {
            roundtrip(op, ctx);
        }
    }
}

#[test]
fn typed_values_roundtrip() {
    let values = [
        Value::Int(-42),
        Value::Float(0.25),
        Value::String("it's \"quoted\"\n".to_string()),
        Value::Uuid(uuid("1ABC+gritzko")),
        Value::Bool(true),
        Value::Null,
    ];
    let op = Op::with_values(uuid("lww"), uuid("mice"), uuid("1+a"), uuid("x"), &values, Term::Regular).unwrap();
    let mut frame = Frame::new();
    frame.push(&op);
    let parsed = frame.try_ops().unwrap();
    assert_eq!(parsed[0].atoms().unwrap().as_slice(), &values);
}

#[test]
fn unsupported_values_fail_without_output() {
    let result = Op::with_values(
        uuid("lww"),
        uuid("mice"),
        uuid("1+a"),
        uuid("x"),
        &[Value::Int(1), Value::Float(f64::INFINITY)],
        Term::Regular,
    );
    assert!(matches!(result, Err(Error::UnsupportedValue(_))));
}

// =============================================================================
// Frames
// =============================================================================

#[test]
fn frames_reproduce_pushed_ops() {
    let pushed = [
        op("lww", "mice", "1+a", "0", "", Term::Header),
        op("lww", "mice", "1+a", "x", "=1", Term::Regular),
        op("lww", "mice", "1+a", "x", "=1", Term::Regular),
        op("lww", "mice", "1+a", "0", "", Term::Regular),
        op("lww", "mice", "2+b", "0", "", Term::Regular),
        op("lww", "mice", "2+b", "y", "", Term::Continuation),
    ];
    let mut frame = Frame::new();
    for op in &pushed {
        frame.push(op);
    }
    assert_eq!(frame.try_ops().unwrap(), pushed);
    // Iterating twice scans the same text twice.
    assert_eq!(frame.ops().count(), (&frame).into_iter().count());
}

#[test]
fn comments_do_not_compress_what_follows() {
    let header = op("lww", "mice", "1+a", "0", "", Term::Header);
    let comment = op("~", "0", "0", "0", "'hello'", Term::Regular);
    let after = op("lww", "mice", "1+a", "x", "=1", Term::Regular);
    let mut frame = Frame::new();
    frame.push(&header);
    frame.push(&comment);
    frame.push(&after);
    // Every field of the op after the comment is written out in full.
    assert!(frame.as_str().ends_with("*lww#mice@1+a:x=1"), "{}", frame.as_str());
    assert_eq!(frame.try_ops().unwrap(), vec![header, comment, after]);
}

#[test]
fn clean_end_and_corruption_are_distinct() {
    let clean = Frame::from("*lww#mice@1+a!:x=1\n");
    assert!(clean.try_ops().is_ok());

    let corrupt = Frame::from("*lww#mice@1+a!:x=1 %%%");
    let mut cursor = corrupt.ops();
    while cursor.advance().is_some() {}
    assert_eq!(cursor.error(), Some(&Error::MalformedOp { offset: 19 }));
    assert_eq!(corrupt.try_ops(), Err(Error::MalformedOp { offset: 19 }));
}

#[test]
fn placeholder_events_are_replaced() {
    let mut frame = Frame::from("*lww#mice@0+local!:x=1:y'two'");
    let local = uuid("0+local");
    let assigned = uuid("1ABC+gritzko");
    frame
        .map_uuids(|id, position, _, _| {
            return (position == Position::Event && id == local).then_some(assigned);
        })
        .unwrap();
    let ops = frame.try_ops().unwrap();
    assert!(ops.iter().all(|op| op.event == assigned));
    assert_eq!(ops[2].value(0).unwrap(), Some(Value::from("two")));
}

#[test]
fn slices_start_with_a_full_op() {
    let frame = Frame::from("*lww#mice@1+a!:x=1:y=2");
    let mut from = Cursor::new(frame.as_str());
    from.advance();
    let mut till = from.clone();
    while till.advance().is_some() {}
    let text = slice(&from, &till).unwrap();
    assert_eq!(text, "*lww#mice@1+a:x=1:y=2");
    // The slice is a frame of its own.
    let ops = Frame::from(text).try_ops().unwrap().len();
    assert_eq!(ops, 2);

    let other = frame.clone();
    assert_eq!(slice(&from, &other.ops()), Err(Error::ForeignCursor));
}

// =============================================================================
// Streams
// =============================================================================

#[test]
fn stream_frames_are_independent() {
    let text = "*lww#mice@1+a!:x=1:y=2.\n*lww#cats@2+b!:z'zz'.\n";
    let frames = stream::split(text);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].as_str(), "*lww#mice@1+a!:x=1:y=2");
    assert_eq!(frames[1].as_str(), "*lww#cats@2+b!:z'zz'");
    // Each chunk is compressed on its own: the second frame writes every field.
    assert_eq!(frames[1].ops().op().map(|op| op.object), Some(uuid("cats")));

    let mut rebuilt = Vec::new();
    for frame in &frames {
        let mut copy = Frame::new();
        for op in frame {
            copy.push(&op);
        }
        rebuilt.push(copy);
    }
    assert_eq!(stream::join(&rebuilt), text);
}
