#![macro_use]

macro_rules! impl_table_id {
    ($idtype: ident, $integer_type: ty) => {
        impl $idtype {
            /// NULL value for the type
            pub const NULL: $idtype = Self(-1);

            /// Return the underlying integer.
            pub fn raw(self) -> $integer_type {
                self.0
            }

            /// `true` if `self` equals [`Self::NULL`].
            pub fn is_null(&self) -> bool {
                *self == Self::NULL
            }
        }

        impl From<$integer_type> for $idtype {
            fn from(value: $integer_type) -> Self {
                if value >= 0 {
                    Self(value)
                } else {
                    Self::NULL
                }
            }
        }

        impl std::fmt::Display for $idtype {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<$idtype> for usize {
            type Error = $crate::TablesError;

            fn try_from(value: $idtype) -> Result<Self, Self::Error> {
                usize::try_from(value.0).map_err(|_| $crate::TablesError::NullId)
            }
        }

        impl TryFrom<usize> for $idtype {
            type Error = $crate::TablesError;

            fn try_from(value: usize) -> Result<Self, Self::Error> {
                let ll = <$integer_type>::try_from(value)
                    .map_err(|_| $crate::TablesError::IdOverflow { value })?;
                Ok(Self(ll))
            }
        }

        impl From<$idtype> for $integer_type {
            fn from(item: $idtype) -> Self {
                item.0
            }
        }

        impl PartialEq<$integer_type> for $idtype {
            fn eq(&self, other: &$integer_type) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$idtype> for $integer_type {
            fn eq(&self, other: &$idtype) -> bool {
                *self == other.0
            }
        }

        impl PartialOrd<$integer_type> for $idtype {
            fn partial_cmp(&self, other: &$integer_type) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl PartialOrd<$idtype> for $integer_type {
            fn partial_cmp(&self, other: &$idtype) -> Option<std::cmp::Ordering> {
                self.partial_cmp(&other.0)
            }
        }
    };
}

macro_rules! impl_float_comparisons {
    ($newtype: ident) => {
        impl PartialEq<f64> for $newtype {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$newtype> for f64 {
            fn eq(&self, other: &$newtype) -> bool {
                *self == other.0
            }
        }

        impl PartialOrd<f64> for $newtype {
            fn partial_cmp(&self, other: &f64) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }

        impl From<f64> for $newtype {
            fn from(value: f64) -> Self {
                Self(value)
            }
        }

        impl From<$newtype> for f64 {
            fn from(value: $newtype) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $newtype {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", self.0)
            }
        }
    };
}
