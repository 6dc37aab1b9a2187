use std::sync::Arc;
use std::thread;

use photon_convert::{
    AnyValue, ConversionEngine, Convertible, DateTime, Decimal, Error, Parser, TypeDescriptor,
    TypeKind, convert, convertible_enum, is_null,
};
use photon_test_utils::init_tracing_for_tests;

convertible_enum! {
    enum Color: i32 {
        Red,
        Green,
        Blue = 7,
    }
}

/// A user type with its own string form and no primitive mapping.
#[derive(Debug, Clone, PartialEq)]
struct Celsius(f64);

impl Convertible for Celsius {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Celsius>(TypeKind::Other)
    }

    fn render(&self) -> String {
        format!("{}°C", self.0)
    }
}

/// A type parsed by an infallible parser.
#[derive(Debug, Clone, PartialEq)]
struct Tag(String);

impl Convertible for Tag {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Tag>(TypeKind::Other)
    }

    fn parser() -> Option<Parser<Self>> {
        Some(Parser::Infallible(|text| Tag(text.to_lowercase())))
    }
}

fn assert_string_round_trip<T: Convertible>(value: T, text: &str) {
    let rendered = convert::<T, String>(value.clone()).unwrap();
    assert_eq!(rendered, text);
    let parsed = convert::<String, T>(rendered).unwrap();
    assert_eq!(parsed, value);
}

#[test]
fn primitives_round_trip_through_strings() {
    init_tracing_for_tests();

    assert_string_round_trip(1i32, "1");
    assert_string_round_trip(true, "true");
    assert_string_round_trip('x', "x");
    assert_string_round_trip(-8i8, "-8");
    assert_string_round_trip(200u8, "200");
    assert_string_round_trip(-300i16, "-300");
    assert_string_round_trip(60_000u16, "60000");
    assert_string_round_trip(4_000_000_000u32, "4000000000");
    assert_string_round_trip(i64::MIN, "-9223372036854775808");
    assert_string_round_trip(u64::MAX, "18446744073709551615");
    assert_string_round_trip(1.5f32, "1.5");
    assert_string_round_trip(-0.25f64, "-0.25");
    assert_string_round_trip(Decimal::new(12345, 2), "123.45");
    let instant = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
    assert_string_round_trip(instant, "2023-11-14T22:13:20Z");
}

#[test]
fn failed_parses_are_invalid_casts() {
    assert!(matches!(
        convert::<String, i32>("twelve".into()),
        Err(Error::InvalidCast(_))
    ));
    assert!(matches!(
        convert::<String, bool>("maybe".into()),
        Err(Error::InvalidCast(_))
    ));
    assert!(matches!(
        convert::<String, Color>("Purple".into()),
        Err(Error::InvalidCast(_))
    ));
}

#[test]
fn nullable_sources_and_targets() {
    assert!(matches!(
        convert::<Option<i32>, i32>(None),
        Err(Error::InvalidOperation(_))
    ));
    assert_eq!(convert::<Option<i32>, i32>(Some(5)).unwrap(), 5);
    assert_eq!(convert::<i32, Option<i32>>(5).unwrap(), Some(5));
    assert_eq!(convert::<Option<i32>, Option<i64>>(None).unwrap(), None);
    assert_eq!(convert::<Option<i32>, Option<i64>>(Some(9)).unwrap(), Some(9));
    assert_eq!(convert::<String, Option<u8>>("7".into()).unwrap(), Some(7));
    assert_eq!(convert::<Option<u8>, String>(Some(7)).unwrap(), "7");

    assert!(is_null(&None::<i32>));
    assert!(!is_null(&Some(1)));
    assert!(!is_null(&1));
}

#[test]
fn narrowing_out_of_range_overflows() {
    assert!(matches!(
        convert::<i64, i16>(i64::MAX),
        Err(Error::Overflow(_))
    ));
    assert!(matches!(convert::<i32, u8>(-1), Err(Error::Overflow(_))));
    assert!(matches!(
        convert::<f64, i32>(f64::INFINITY),
        Err(Error::Overflow(_))
    ));
    assert_eq!(convert::<i64, i16>(-42).unwrap(), -42);
    assert_eq!(convert::<u8, f64>(255).unwrap(), 255.0);
}

#[test]
fn dates_do_not_convert_to_integers() {
    assert!(matches!(
        convert::<DateTime, i16>(DateTime::now()),
        Err(Error::InvalidCast(_))
    ));
}

#[test]
fn enumerations_convert_by_ordinal_and_name() {
    assert_eq!(convert::<Color, i32>(Color::Blue).unwrap(), 7);
    assert_eq!(convert::<Color, String>(Color::Green).unwrap(), "Green");
    // i64 is only reachable from the underlying i32 by widening.
    assert_eq!(convert::<Color, i64>(Color::Blue).unwrap(), 7);
    assert_eq!(convert::<Color, Decimal>(Color::Green).unwrap(), Decimal::ONE);
    assert_eq!(convert::<i32, Color>(7).unwrap(), Color::Blue);
    assert_eq!(convert::<String, Color>("Red".into()).unwrap(), Color::Red);
    assert_eq!(convert::<String, Color>("1".into()).unwrap(), Color::Green);
    assert!(matches!(convert::<i32, Color>(3), Err(Error::InvalidCast(_))));
}

#[test]
fn registered_casts_take_precedence() {
    let engine = ConversionEngine::new();
    assert_eq!(engine.convert::<Color, i64>(Color::Blue).unwrap(), 7);

    // Registration must replace the cached primitive converter.
    engine
        .register_cast::<Color, i64, _>(|color| match color {
            Color::Red => 100,
            Color::Green => 200,
            Color::Blue => 300,
        })
        .unwrap();
    assert_eq!(engine.convert::<Color, i64>(Color::Blue).unwrap(), 300);
    assert_eq!(
        engine.convert::<Option<Color>, Option<i64>>(Some(Color::Red)).unwrap(),
        Some(100)
    );

    // The process-wide engine is unaffected.
    assert_eq!(convert::<Color, i64>(Color::Blue).unwrap(), 7);
}

#[test]
fn from_implementations_register_as_casts() {
    #[derive(Debug, Clone, PartialEq)]
    struct Meters(f64);

    impl Convertible for Meters {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Meters>(TypeKind::Other)
        }
    }

    impl From<u32> for Meters {
        fn from(value: u32) -> Self {
            Meters(f64::from(value))
        }
    }

    let engine = ConversionEngine::new();
    assert!(matches!(
        engine.convert::<u32, Meters>(3),
        Err(Error::InvalidCast(_))
    ));
    engine.register_from::<u32, Meters>().unwrap();
    assert_eq!(engine.convert::<u32, Meters>(3).unwrap(), Meters(3.0));
}

#[test]
fn parsers_and_string_fallback() {
    assert_eq!(
        convert::<String, Tag>("MiXeD".into()).unwrap(),
        Tag("mixed".into())
    );
    assert_eq!(convert::<Celsius, String>(Celsius(21.5)).unwrap(), "21.5°C");
    assert!(matches!(
        convert::<Celsius, i32>(Celsius(1.0)),
        Err(Error::InvalidCast(_))
    ));
}

#[test]
fn boxed_values_resolve_against_runtime_type() {
    let boxed = AnyValue::new(42i32);
    assert_eq!(convert::<AnyValue, i64>(boxed.clone()).unwrap(), 42);
    assert_eq!(convert::<AnyValue, String>(boxed.clone()).unwrap(), "42");
    assert_eq!(convert::<AnyValue, Option<u8>>(boxed).unwrap(), Some(42));

    let text = AnyValue::new("17".to_string());
    assert_eq!(convert::<AnyValue, i32>(text).unwrap(), 17);

    let color = AnyValue::new(Color::Green);
    assert_eq!(convert::<AnyValue, String>(color).unwrap(), "Green");

    assert!(matches!(
        convert::<AnyValue, i32>(AnyValue::null()),
        Err(Error::InvalidOperation(_))
    ));
    assert_eq!(convert::<AnyValue, Option<i32>>(AnyValue::null()).unwrap(), None);

    assert_eq!(
        convert::<Option<i32>, AnyValue>(Some(3)).unwrap(),
        AnyValue::new(3i32)
    );
    assert!(convert::<Option<i32>, AnyValue>(None).unwrap().is_null());
}

#[test]
fn converters_are_cached_per_pair() {
    let engine = ConversionEngine::new();
    assert_eq!(engine.cached_converters(), 0);
    engine.convert::<i32, String>(1).unwrap();
    engine.convert::<i32, String>(2).unwrap();
    assert_eq!(engine.cached_converters(), 1);
    engine.convert::<i32, i32>(2).unwrap();
    assert_eq!(engine.cached_converters(), 1);
    engine.convert::<Option<i32>, i64>(Some(1)).unwrap();
    // The nullable converter composes the cached i32 -> i64 converter.
    assert_eq!(engine.cached_converters(), 3);
}

#[test]
fn engine_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConversionEngine>();
    assert_send_sync::<AnyValue>();
}

/// Many threads resolving the same pairs concurrently all observe working
/// converters and the cache ends up with one entry per pair.
#[test]
fn concurrent_cache_population() {
    init_tracing_for_tests();

    const THREADS: usize = 8;
    const ROUNDS: i32 = 500;

    let engine = Arc::new(ConversionEngine::new());
    let mut handles = Vec::new();
    for tid in 0..THREADS {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..ROUNDS {
                let text = engine.convert::<i32, String>(i).unwrap();
                assert_eq!(engine.convert::<String, i32>(text).unwrap(), i);
                let wide = engine.convert::<Option<i32>, i64>(Some(i)).unwrap();
                assert_eq!(wide, i64::from(i));
                if tid % 2 == 0 {
                    let name = engine.convert::<Color, String>(Color::Blue).unwrap();
                    assert_eq!(name, "Blue");
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    // i32->String, String->i32, Option<i32>->i64, i32->i64, Color->String
    assert_eq!(engine.cached_converters(), 5);
}
