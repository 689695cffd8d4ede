//! 转换属性测试
//!
//! 使用proptest验证原生值经过引擎后保持语义

use proptest::prelude::*;

use super::test_support::context;
use super::{FromJs, ToJs};
use crate::Value;

// 2^53 以内的整数可以被双精度浮点精确表示
fn safe_i64() -> impl Strategy<Value = i64> {
    -(1i64 << 53)..=(1i64 << 53)
}

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("must be finite", |x| x.is_finite())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn i64_survives_script_arithmetic(n in safe_i64()) {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        context.add_variable("n", &n).unwrap();
        let back = i64::from_js(ctx, context.eval_global("n + 0").unwrap().as_raw()).unwrap();
        prop_assert_eq!(back, n);
    }

    #[test]
    fn narrow_ints_truncate_like_casts(n in any::<i32>()) {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        let raw = n.to_js(ctx).unwrap();
        let value = unsafe { Value::from_owned(ctx.clone(), raw) };
        prop_assert_eq!(u8::from_js(ctx, value.as_raw()).unwrap(), n as u8);
        prop_assert_eq!(i16::from_js(ctx, value.as_raw()).unwrap(), n as i16);
        prop_assert_eq!(u32::from_js(ctx, value.as_raw()).unwrap(), n as u32);
    }

    #[test]
    fn f64_matches_script_multiplication(a in finite_f64(), b in -1.0e6f64..1.0e6) {
        let (_rt, context) = context();
        let ctx = context.ctx().unwrap();
        context.add_variable("a", &a).unwrap().add_variable("b", &b).unwrap();
        let product = f64::from_js(ctx, context.eval_global("a * b").unwrap().as_raw()).unwrap();
        prop_assert_eq!(product.to_bits(), (a * b).to_bits());
    }

    #[test]
    fn strings_keep_length_in_utf16_units(s in "\\PC{0,32}") {
        let (_rt, context) = context();
        context.add_variable("s", s.as_str()).unwrap();
        let length = context.eval_global("s.length").unwrap().to_i32().unwrap();
        prop_assert_eq!(length as usize, s.encode_utf16().count());
        let back: String = context.eval_global("s").unwrap().to_rust().unwrap();
        prop_assert_eq!(back, s);
    }

    #[test]
    fn vectors_keep_order(items in prop::collection::vec(any::<i32>(), 0..16)) {
        let (_rt, context) = context();
        context.add_variable("items", &items).unwrap();
        let reversed: Vec<i32> = context
            .eval_global("items.slice().reverse()")
            .unwrap()
            .to_rust()
            .unwrap();
        let mut expected = items.clone();
        expected.reverse();
        prop_assert_eq!(reversed, expected);
    }
}
