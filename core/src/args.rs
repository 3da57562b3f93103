//! Call argument disambiguation.
//!
//! An action accepts up to four positional arguments. Which of them is the
//! query params, the body, the success callback or the error callback depends
//! only on how many there are, which ones are callbacks, and whether the
//! action carries a body. [`classify`] encodes that table as a pure function
//! over argument kinds; [`resolve_args`] applies it to real arguments.

use serde_json::Value;

use crate::error::ResourceError;
use crate::transport::Callback;

/// One positional argument of an action call.
///
/// A value landing in the params slot only contributes when it is an
/// object; anything else is ignored with a warning.
#[derive(Debug)]
pub enum CallArg {
    Value(Value),
    Callback(Callback),
}

impl CallArg {
    pub fn is_callback(&self) -> bool {
        matches!(self, CallArg::Callback(_))
    }

    fn into_value(self) -> Option<Value> {
        match self {
            CallArg::Value(value) => Some(value),
            CallArg::Callback(_) => None,
        }
    }

    fn into_callback(self) -> Option<Callback> {
        match self {
            CallArg::Callback(callback) => Some(callback),
            CallArg::Value(_) => None,
        }
    }
}

impl From<Value> for CallArg {
    fn from(value: Value) -> Self {
        CallArg::Value(value)
    }
}

impl From<Callback> for CallArg {
    fn from(callback: Callback) -> Self {
        CallArg::Callback(callback)
    }
}

/// Which argument position fills each slot. Positions are zero-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgLayout {
    pub params: Option<usize>,
    pub data: Option<usize>,
    pub on_success: Option<usize>,
    pub on_error: Option<usize>,
}

/// Map argument kinds (`true` = callback) onto slots.
///
/// | count | shape                     | result                                        |
/// |-------|---------------------------|-----------------------------------------------|
/// | 4     | 2nd is a value            | params, data, success, error                  |
/// | 2..=4 | 1st and 2nd are callbacks | success = 1st, error = 2nd                    |
/// | 2..=4 | only 2nd is a callback    | success = 2nd, error = 3rd, 1st as if alone   |
/// | 2, 3  | 2nd is a value            | params = 1st, data = 2nd, success = 3rd       |
/// | 1     | callback                  | success                                       |
/// | 1     | value                     | data if the action has a body, else params    |
///
/// Slots beyond the table are dropped, as are values sitting in callback
/// slots and callbacks sitting in value slots.
pub fn classify(has_body: bool, callbacks: &[bool]) -> Result<ArgLayout, ResourceError> {
    let mut layout = ArgLayout::default();
    match callbacks.len() {
        0 => {}
        1 => layout.assign_single(has_body, callbacks[0]),
        count @ 2..=4 => {
            if callbacks[1] {
                if callbacks[0] {
                    layout.on_success = Some(0);
                    layout.on_error = Some(1);
                } else {
                    layout.on_success = Some(1);
                    layout.on_error = (count >= 3).then_some(2);
                    layout.assign_single(has_body, false);
                }
            } else {
                layout.params = Some(0);
                layout.data = Some(1);
                layout.on_success = (count >= 3).then_some(2);
                layout.on_error = (count == 4).then_some(3);
            }
        }
        count => return Err(ResourceError::TooManyArguments(count)),
    }
    Ok(layout)
}

impl ArgLayout {
    fn assign_single(&mut self, has_body: bool, is_callback: bool) {
        if is_callback {
            self.on_success = Some(0);
        } else if has_body {
            self.data = Some(0);
        } else {
            self.params = Some(0);
        }
    }
}

/// The canonical form of an action call.
#[derive(Debug, Default)]
pub struct Invocation {
    pub params: Option<Value>,
    pub data: Option<Value>,
    pub on_success: Option<Callback>,
    pub on_error: Option<Callback>,
}

pub fn resolve_args(has_body: bool, args: Vec<CallArg>) -> Result<Invocation, ResourceError> {
    let kinds: Vec<bool> = args.iter().map(CallArg::is_callback).collect();
    let layout = classify(has_body, &kinds)?;

    let mut slots: Vec<Option<CallArg>> = args.into_iter().map(Some).collect();
    let mut take = |position: Option<usize>| -> Option<CallArg> {
        position.and_then(|i| slots.get_mut(i)?.take())
    };

    Ok(Invocation {
        params: take(layout.params).and_then(CallArg::into_value),
        data: take(layout.data).and_then(CallArg::into_value),
        on_success: take(layout.on_success).and_then(CallArg::into_callback),
        on_error: take(layout.on_error).and_then(CallArg::into_callback),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    const V: bool = false;
    const F: bool = true;

    fn layout(
        params: Option<usize>,
        data: Option<usize>,
        on_success: Option<usize>,
        on_error: Option<usize>,
    ) -> ArgLayout {
        ArgLayout {
            params,
            data,
            on_success,
            on_error,
        }
    }

    #[rstest]
    #[case::none(false, vec![], layout(None, None, None, None))]
    #[case::single_value_no_body(false, vec![V], layout(Some(0), None, None, None))]
    #[case::single_value_with_body(true, vec![V], layout(None, Some(0), None, None))]
    #[case::single_callback(true, vec![F], layout(None, None, Some(0), None))]
    #[case::two_callbacks(false, vec![F, F], layout(None, None, Some(0), Some(1)))]
    #[case::value_then_callback(false, vec![V, F], layout(Some(0), None, Some(1), None))]
    #[case::body_then_callback(true, vec![V, F], layout(None, Some(0), Some(1), None))]
    #[case::params_and_data(false, vec![V, V], layout(Some(0), Some(1), None, None))]
    #[case::three_params_data_success(true, vec![V, V, F], layout(Some(0), Some(1), Some(2), None))]
    #[case::three_value_two_callbacks(false, vec![V, F, F], layout(Some(0), None, Some(1), Some(2)))]
    #[case::three_body_two_callbacks(true, vec![V, F, F], layout(None, Some(0), Some(1), Some(2)))]
    #[case::three_leading_callbacks(false, vec![F, F, V], layout(None, None, Some(0), Some(1)))]
    #[case::four_full(true, vec![V, V, F, F], layout(Some(0), Some(1), Some(2), Some(3)))]
    #[case::four_second_callback(true, vec![V, F, F, F], layout(None, Some(0), Some(1), Some(2)))]
    #[case::four_leading_callbacks(false, vec![F, F, F, F], layout(None, None, Some(0), Some(1)))]
    fn classifies_argument_shapes(
        #[case] has_body: bool,
        #[case] kinds: Vec<bool>,
        #[case] expected: ArgLayout,
    ) {
        assert_eq!(classify(has_body, &kinds), Ok(expected));
    }

    #[test]
    fn five_arguments_are_rejected() {
        assert_eq!(
            classify(false, &[V, V, F, F, F]),
            Err(ResourceError::TooManyArguments(5))
        );
    }

    #[test]
    fn resolve_moves_values_into_slots() {
        let args = vec![
            CallArg::from(json!({"id": 1})),
            CallArg::from(json!({"name": "n"})),
            CallArg::from(Callback::new(|_| {})),
            CallArg::from(Callback::new(|_| {})),
        ];
        let invocation = resolve_args(true, args).unwrap();
        assert_eq!(invocation.params, Some(json!({"id": 1})));
        assert_eq!(invocation.data, Some(json!({"name": "n"})));
        assert!(invocation.on_success.is_some());
        assert!(invocation.on_error.is_some());
    }

    #[test]
    fn resolve_with_no_arguments_leaves_everything_unset() {
        let invocation = resolve_args(true, Vec::new()).unwrap();
        assert!(invocation.params.is_none());
        assert!(invocation.data.is_none());
        assert!(invocation.on_success.is_none());
        assert!(invocation.on_error.is_none());
    }

    #[test]
    fn value_in_callback_slot_is_dropped() {
        let args = vec![json!({}).into(), json!({}).into(), json!("not callable").into()];
        let invocation = resolve_args(false, args).unwrap();
        assert!(invocation.on_success.is_none());
    }

    #[test]
    fn resolve_rejects_five_arguments() {
        let args = (0..5).map(|i| CallArg::from(json!(i))).collect();
        let err = resolve_args(false, args).unwrap_err();
        assert_eq!(err, ResourceError::TooManyArguments(5));
    }
}
