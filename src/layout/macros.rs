/// Declares a bridged struct and its [`FixedLayout`](crate::layout::FixedLayout)
/// impl from one field list.
///
/// The packing rule picks the `repr` attribute and the descriptor's
/// [`Packing`](crate::layout::Packing) together, so the two cannot disagree.
///
/// ```
/// struct_bridge::fixed_layout! {
///     packed(2), version 1;
///     /// A sample record.
///     pub struct Sample {
///         pub tag: u16,
///         pub stamp: u64,
///     }
/// }
///
/// use struct_bridge::layout::{verify_layout, FixedLayout};
/// assert_eq!(Sample::LAYOUT.size(), 10);
/// verify_layout::<Sample>().unwrap();
/// ```
#[macro_export]
macro_rules! fixed_layout {
    (
        packed($pack:tt), version $version:literal;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C, packed($pack))]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name {
            $($(#[$fmeta])* $fvis $field: $ty),+
        }

        $crate::fixed_layout!(
            @impl $name,
            match $crate::layout::PackAlign::new($pack) {
                ::core::option::Option::Some(n) => $crate::layout::Packing::Packed(n),
                ::core::option::Option::None => ::core::panic!("packing must be a power of two"),
            },
            $version;
            $($field: $ty),+
        );
    };

    (
        natural, version $version:literal;
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $name {
            $($(#[$fmeta])* $fvis $field: $ty),+
        }

        $crate::fixed_layout!(@impl $name, $crate::layout::Packing::Natural, $version; $($field: $ty),+);
    };

    (@impl $name:ident, $packing:expr, $version:literal; $($field:ident : $ty:ty),+) => {
        impl $crate::layout::FixedLayout for $name {
            const LAYOUT: $crate::layout::LayoutDescriptor = $crate::layout::LayoutDescriptor {
                name: stringify!($name),
                version: $version,
                packing: $packing,
                fields: &[$(
                    $crate::layout::FieldSpec {
                        name: stringify!($field),
                        ty: <$ty as $crate::layout::FieldShape>::TYPE,
                        count: <$ty as $crate::layout::FieldShape>::COUNT,
                    }
                ),+],
            };

            const OFFSETS: &'static [usize] = &[$(::core::mem::offset_of!($name, $field)),+];
        }
    };
}
