/// A clap value parser accepting exactly the strum serializations of `$e`.
#[macro_export]
macro_rules! clap_enum_variants {
    ($e: ty) => {{
        use clap::builder::TypedValueParser;
        use strum::VariantNames;
        clap::builder::PossibleValuesParser::new(<$e>::VARIANTS).map(|s| s.parse::<$e>().unwrap())
    }};
}

/// Calls `function::<T>(args)` with `T` the coefficient type selected by the
/// `DomainArgument` in the variable `domain`.
#[macro_export]
macro_rules! call_with_domain {
    ($function:ident::<$domain:ident>($($args:expr),*) ) => {
        match $domain {
            DomainArgument::F2 => $function::<blockmul_number::Gf2>($($args),*),
            DomainArgument::R => $function::<i64>($($args),*),
        }
    };
}
