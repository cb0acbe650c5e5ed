use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ItemFn;

const SCORING_FN: &str = "score_feature";

#[derive(deluxe::ParseMetaItem)]
struct FeatureAttributes(syn::Ident, #[deluxe(flatten)] FeatureOptions);

#[derive(deluxe::ParseMetaItem)]
struct FeatureOptions {
  name: String,
}

fn is_snake_case(name: &str) -> bool {
  name.starts_with(|c: char| c.is_ascii_lowercase()) && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn expand(attrs: TokenStream2, input: TokenStream2) -> syn::Result<TokenStream2> {
  let FeatureAttributes(ident, FeatureOptions { name }) = deluxe::parse2::<FeatureAttributes>(attrs)?;
  let function = syn::parse2::<ItemFn>(input)?;

  if function.sig.ident != SCORING_FN {
    return Err(syn::Error::new(function.sig.ident.span(), format!("a scoring feature is declared as `fn {SCORING_FN}`")));
  }

  if !is_snake_case(&name) {
    return Err(syn::Error::new(ident.span(), format!("feature name {name:?} is not snake_case")));
  }

  let doc = format!("Scoring feature reported as `{name}`.");

  Ok(quote! {
    #[doc = #doc]
    #[derive(Clone, Copy, Debug, Default)]
    pub(crate) struct #ident;

    impl Feature for #ident {
      fn name(&self) -> &'static str {
        #name
      }

      #[tracing::instrument(level = "trace", name = #name, skip_all, fields(strategy = %candidate.strategy))]
      #function
    }
  })
}

/// Declare a unit struct implementing `Feature` from a bare `score_feature`
/// function.
///
/// The function takes `(&self, candidate: &Candidate, context: &ScoringContext)`
/// and the feature name, used in traces and score breakdowns, is snake_case.
#[proc_macro_attribute]
pub fn scoring_feature(attrs: TokenStream, input: TokenStream) -> TokenStream {
  expand(attrs.into(), input.into()).unwrap_or_else(syn::Error::into_compile_error).into()
}

#[cfg(test)]
mod tests {
  use quote::quote;

  #[test]
  fn expands_to_feature_impl() {
    let output = super::expand(
      quote!(Authority, name = "brand_authority"),
      quote! {
        fn score_feature(&self, candidate: &Candidate, context: &ScoringContext) -> f64 { 1.0 }
      },
    )
    .unwrap()
    .to_string();

    assert!(output.contains("pub (crate) struct Authority"));
    assert!(output.contains("impl Feature for Authority"));
    assert!(output.contains("\"brand_authority\""));
  }

  #[test]
  fn rejects_other_function_names() {
    let err = super::expand(quote!(Authority, name = "brand_authority"), quote!(fn score(&self) -> f64 { 1.0 })).unwrap_err();

    assert!(err.to_string().contains("fn score_feature"));
  }

  #[test]
  fn rejects_non_snake_case_names() {
    for name in ["BrandAuthority", "brand authority", "", "_brand"] {
      assert!(super::expand(quote!(Authority, name = #name), quote!(fn score_feature(&self) -> f64 { 1.0 })).is_err(), "{name}");
    }
  }
}
