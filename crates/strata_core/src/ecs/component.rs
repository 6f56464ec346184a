//! # Component System
//!
//! Components are pure data containers with no behavior.
//! Each concrete component type gets exactly one pool in the world, created
//! lazily the first time the type is used.

/// Marker trait for ECS components.
///
/// Any `'static` data record can be a component. Pools are keyed by the
/// implementing type, so a type can only ever live in one pool and an entity
/// holds at most one value of it.
///
/// # Example
///
/// ```rust
/// use strata_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct Health {
///     current: u32,
///     max: u32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: 'static {
    /// Human-readable name used in logs and error messages.
    #[must_use]
    fn component_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl Component for Marker {}

    struct Named;
    impl Component for Named {
        fn component_name() -> &'static str {
            "Named"
        }
    }

    #[test]
    fn test_component_name() {
        assert!(Marker::component_name().ends_with("Marker"));
        assert_eq!(Named::component_name(), "Named");
    }
}
