use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Layout", inline)]
#[serde(default)]
/// Class and attribute names forming the visible DOM contract.
pub struct LayoutOptions {
    /// Class applied to the gallery root element.
    #[schemars(title = "Gallery Class")]
    pub gallery_class: String,
    /// Class applied to every module container.
    #[schemars(title = "Container Class")]
    pub container_class: String,
    /// Marker class toggled on a container while its animations are paused.
    #[schemars(skip)]
    pub paused_class: String,
    /// Attribute carrying the module identifier on each container.
    #[schemars(skip)]
    pub module_attribute: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gallery_class: "swiss-grid".to_owned(),
            container_class: "module-container col-span-12 md:col-span-6 \
                              lg:col-span-4"
                .to_owned(),
            paused_class: crate::motion::PAUSED_CLASS.to_owned(),
            module_attribute: crate::motion::MODULE_ATTRIBUTE.to_owned(),
        }
    }
}
