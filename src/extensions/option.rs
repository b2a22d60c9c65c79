pub trait OptionExt<T> {
    fn when<F>(cond: bool, fa: F) -> Option<T>
    where
        F: FnOnce() -> T;

    fn to_result<E, F>(self, on_empty: F) -> Result<T, E>
    where
        F: FnOnce() -> E;
}

impl<T> OptionExt<T> for Option<T> {
    fn when<F>(cond: bool, fa: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        if cond {
            Some(fa())
        } else {
            None
        }
    }

    fn to_result<E, F>(self, on_empty: F) -> Result<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            Some(v) => Ok(v),
            None => Err(on_empty()),
        }
    }
}

/// Treats blank text the same as missing text.
pub trait NonBlankExt<'a> {
    fn non_blank(self) -> Option<&'a str>;
}

impl<'a> NonBlankExt<'a> for Option<&'a str> {
    fn non_blank(self) -> Option<&'a str> {
        self.filter(|text| !text.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_builds_value_only_on_true() {
        assert_eq!(Option::when(true, || 7), Some(7));
        assert_eq!(Option::<i32>::when(false, || 7), None);
    }

    #[test]
    fn to_result_maps_empty_to_error() {
        let missing: Option<u8> = None;
        assert_eq!(missing.to_result(|| "empty"), Err("empty"));
        assert_eq!(Some(1u8).to_result(|| "empty"), Ok(1));
    }

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(Some("  ").non_blank(), None);
        assert_eq!(Some("").non_blank(), None);
        assert_eq!(Some("x").non_blank(), Some("x"));
        assert_eq!(None.non_blank(), None);
    }
}
