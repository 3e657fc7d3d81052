//! Builder macro for configuration types.

/// Generate a builder for a configuration type that implements `Default`.
///
/// ```ignore
/// impl_builder!(ExploreConfig, ExploreConfigBuilder {
///     defaulted { warn_on_degenerate: bool }
///     limits { max_states }
/// });
/// ```
///
/// - `defaulted { field: Type }`: setter takes `impl Into<Type>`; an unset
///   field keeps the value from `Default`.
/// - `limits { field }`: an `Option<usize>` bound. The setter takes a plain
///   `usize`, so untyped literals work. `build()` rejects a zero bound with
///   [`BuilderError::ZeroLimit`]; an unset field keeps the default.
///
/// Also adds `Config::builder()` and `Builder::from_config(config)` for
/// tweaking an existing configuration.
///
/// [`BuilderError::ZeroLimit`]: crate::error::BuilderError::ZeroLimit
macro_rules! impl_builder {
    (
        $Config:ident, $Builder:ident {
            defaulted { $( $field:ident : $ty:ty ),* $(,)? }
            limits { $( $limit:ident ),* $(,)? }
        }
    ) => {
        #[doc = concat!("Builder for [`", stringify!($Config), "`].")]
        #[derive(Debug, Clone, Default)]
        pub struct $Builder {
            base: $Config,
            $( $limit: Option<usize>, )*
        }

        impl $Config {
            pub fn builder() -> $Builder {
                $Builder::default()
            }
        }

        impl $Builder {
            /// Start from `config` instead of the defaults.
            pub fn from_config(config: $Config) -> Self {
                Self {
                    base: config,
                    $( $limit: None, )*
                }
            }

            $(
                pub fn $field(mut self, value: impl Into<$ty>) -> Self {
                    self.base.$field = value.into();
                    self
                }
            )*

            $(
                pub fn $limit(mut self, value: usize) -> Self {
                    self.$limit = Some(value);
                    self
                }
            )*

            pub fn build(self) -> Result<$Config, $crate::error::BuilderError> {
                let mut config = self.base;
                $(
                    if let Some(value) = self.$limit {
                        if value == 0 {
                            return Err($crate::error::BuilderError::ZeroLimit {
                                builder: stringify!($Builder),
                                field: stringify!($limit),
                            });
                        }
                        config.$limit = Some(value);
                    }
                )*
                Ok(config)
            }
        }
    };
}

pub(crate) use impl_builder;
