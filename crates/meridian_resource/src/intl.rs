//! Localized string resources.
//!
//! Plugins declare their user-facing messages under the `string` category.
//! The id is all the resource layer knows about a message; loading and
//! formatting happen in the platform layer.

use crate::id::Category;
use crate::id::ResourceId;
use crate::leaf::Leaf;
use crate::provider::ResourceProvider;
use crate::status::Params;

/// Category tag of localized strings.
#[derive(Debug, Clone, Copy)]
pub struct StringCategory;

impl Category for StringCategory {
    const NAME: &'static str = "string";
}

/// Id of a localized message formatted with parameters of type `P`.
pub type IntlString<P = Params> = ResourceId<StringCategory, P>;

/// Provider of the `string` category.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntlProvider;

impl ResourceProvider for IntlProvider {
    type Category = StringCategory;
}

impl IntlProvider {
    /// A message id; the text itself comes from the plugin's string loader.
    #[must_use]
    pub fn string<P: 'static>(&self) -> Leaf<IntlString<P>> {
        Leaf::external()
    }
}
