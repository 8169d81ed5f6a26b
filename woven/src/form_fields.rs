/// Create an enum of focusable controls that can be cycled through with
/// tab/shift-tab. Variants are visited in declaration order and wrap around.
#[macro_export]
macro_rules! focus_ring {
    ($name:ident, $($variant:ident),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            const RING: &'static [$name] = &[
                $($name::$variant),+
            ];

            fn position(self) -> usize {
                Self::RING
                    .iter()
                    .position(|candidate| *candidate == self)
                    .unwrap_or_default()
            }

            /// Move focus forward (e.g. with tab)
            pub fn next(self) -> Self {
                Self::RING[(self.position() + 1) % Self::RING.len()]
            }

            /// Move focus backward (e.g. with shift-tab)
            pub fn prev(self) -> Self {
                Self::RING[(self.position() + Self::RING.len() - 1) % Self::RING.len()]
            }
        }
    };
}
