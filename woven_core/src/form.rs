use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// Values a form collects, addressable by field.
pub trait FormValues {
    /// The set of fields in this form.
    type Field: Copy + Ord + Debug + 'static;

    /// Get the current value of a field.
    fn value(&self, field: Self::Field) -> &str;

    /// Replace the current value of a field.
    fn set_value(&mut self, field: Self::Field, value: String);

    /// Every field, in display order.
    fn fields() -> &'static [Self::Field];
}

/// A single constraint on a field: if `test` returns false for the field's
/// value, the field has `message` as its error.
#[derive(Debug, Clone, Copy)]
pub struct Rule<F> {
    /// Which field this rule applies to
    pub field: F,

    /// Returns true when the value is acceptable
    pub test: fn(&str) -> bool,

    /// What to show the user when `test` fails
    pub message: &'static str,
}

/// Per-field error messages. Fields without an entry are valid.
pub type Errors<F> = BTreeMap<F, &'static str>;

/// An ordered set of rules. When several rules fail for one field, the first
/// one wins.
#[derive(Debug, Clone)]
pub struct Schema<F> {
    rules: Vec<Rule<F>>,
}

impl<F: Copy + Ord + 'static> Schema<F> {
    /// Build a schema from rules, in evaluation order.
    pub fn new(rules: Vec<Rule<F>>) -> Self {
        Self { rules }
    }

    /// Validate a single field against the current values.
    pub fn validate_field<V>(&self, values: &V, field: F) -> Option<&'static str>
    where
        V: FormValues<Field = F>,
    {
        let value = values.value(field);

        self.rules
            .iter()
            .filter(|rule| rule.field == field)
            .find(|rule| !(rule.test)(value))
            .map(|rule| rule.message)
    }

    /// Validate every field.
    pub fn validate<V>(&self, values: &V) -> Errors<F>
    where
        V: FormValues<Field = F>,
    {
        V::fields()
            .iter()
            .filter_map(|field| {
                self.validate_field(values, *field)
                    .map(|message| (*field, message))
            })
            .collect()
    }
}

/// Form values plus the touched/error bookkeeping a UI needs to decide what
/// to show. This is a thin layer over `Schema::validate`; it does not know
/// anything about how input arrives.
#[derive(Debug, Clone)]
pub struct FormState<V: FormValues> {
    schema: Schema<V::Field>,
    values: V,
    touched: BTreeSet<V::Field>,
    errors: Errors<V::Field>,
}

impl<V> FormState<V>
where
    V: FormValues + Clone,
{
    /// Start a form with the given initial values. Errors are computed up
    /// front but none are visible until fields are touched.
    pub fn new(schema: Schema<V::Field>, values: V) -> Self {
        let errors = schema.validate(&values);

        Self {
            schema,
            values,
            touched: BTreeSet::new(),
            errors,
        }
    }

    /// The current values.
    pub fn values(&self) -> &V {
        &self.values
    }

    /// Update a field's value (e.g. on every keystroke.)
    pub fn change(&mut self, field: V::Field, value: String) {
        self.values.set_value(field, value);
        self.revalidate(field);
    }

    /// The user left a field. Marks it touched and revalidates it.
    pub fn blur(&mut self, field: V::Field) {
        self.touched.insert(field);
        self.revalidate(field);
    }

    /// Attempt to submit. Every field becomes touched and the whole form is
    /// revalidated. Returns the values to submit only if there are no errors.
    ///
    /// ## Errors
    ///
    /// Returns the current per-field errors if any field is invalid.
    pub fn submit(&mut self) -> Result<V, Errors<V::Field>> {
        self.touched.extend(V::fields().iter().copied());
        self.errors = self.schema.validate(&self.values);

        if self.errors.is_empty() {
            Ok(self.values.clone())
        } else {
            Err(self.errors.clone())
        }
    }

    /// The current error for a field, whether or not it should be shown.
    pub fn error(&self, field: V::Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    /// The error to display for a field. Untouched fields never display one.
    pub fn visible_error(&self, field: V::Field) -> Option<&'static str> {
        if self.is_touched(field) {
            self.error(field)
        } else {
            None
        }
    }

    /// Has the user interacted with this field yet?
    pub fn is_touched(&self, field: V::Field) -> bool {
        self.touched.contains(&field)
    }

    fn revalidate(&mut self, field: V::Field) {
        match self.schema.validate_field(&self.values, field) {
            Some(message) => self.errors.insert(field, message),
            None => self.errors.remove(&field),
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Pair {
        left: String,
        right: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Side {
        Left,
        Right,
    }

    impl FormValues for Pair {
        type Field = Side;

        fn value(&self, field: Side) -> &str {
            match field {
                Side::Left => &self.left,
                Side::Right => &self.right,
            }
        }

        fn set_value(&mut self, field: Side, value: String) {
            match field {
                Side::Left => self.left = value,
                Side::Right => self.right = value,
            }
        }

        fn fields() -> &'static [Side] {
            &[Side::Left, Side::Right]
        }
    }

    fn schema() -> Schema<Side> {
        Schema::new(vec![
            Rule {
                field: Side::Left,
                test: |value| !value.is_empty(),
                message: "left is required",
            },
            Rule {
                field: Side::Left,
                test: |value| value.len() >= 3,
                message: "left is too short",
            },
            Rule {
                field: Side::Right,
                test: |value| value.chars().all(|c| c.is_ascii_digit()),
                message: "right must be digits",
            },
        ])
    }

    #[test]
    fn first_failing_rule_wins() {
        let errors = schema().validate(&Pair::default());

        assert_eq!(errors.get(&Side::Left), Some(&"left is required"));
        assert_eq!(errors.get(&Side::Right), None);
    }

    #[test]
    fn later_rule_applies_when_earlier_passes() {
        let values = Pair {
            left: "ab".to_string(),
            right: "12x".to_string(),
        };

        let errors = schema().validate(&values);

        assert_eq!(errors.get(&Side::Left), Some(&"left is too short"));
        assert_eq!(errors.get(&Side::Right), Some(&"right must be digits"));
    }

    #[test]
    fn errors_are_hidden_until_touched() {
        let form = FormState::new(schema(), Pair::default());

        assert_eq!(form.error(Side::Left), Some("left is required"));
        assert_eq!(form.visible_error(Side::Left), None);
    }

    #[test]
    fn blur_marks_touched_and_shows_error() {
        let mut form = FormState::new(schema(), Pair::default());

        form.blur(Side::Left);

        assert!(form.is_touched(Side::Left));
        assert!(!form.is_touched(Side::Right));
        assert_eq!(form.visible_error(Side::Left), Some("left is required"));
    }

    #[test]
    fn change_clears_a_fixed_error() {
        let mut form = FormState::new(schema(), Pair::default());
        form.blur(Side::Left);

        form.change(Side::Left, "abc".to_string());

        assert_eq!(form.visible_error(Side::Left), None);
        assert_eq!(form.error(Side::Left), None);
    }

    #[test]
    fn submit_touches_everything_and_blocks_on_errors() {
        let mut form = FormState::new(schema(), Pair::default());

        let errors = form.submit().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(form.is_touched(Side::Left));
        assert!(form.is_touched(Side::Right));
    }

    #[test]
    fn submit_returns_values_when_valid() {
        let mut form = FormState::new(schema(), Pair::default());
        form.change(Side::Left, "abc".to_string());
        form.change(Side::Right, "123".to_string());

        let values = form.submit().unwrap();

        assert_eq!(values.left, "abc");
        assert_eq!(values.right, "123");
    }
}
