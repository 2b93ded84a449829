//! Feature type discovery from a WFS `GetCapabilities` document.

use crate::error::{Result, WfsError};
use crate::models::CollectionRef;
use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Title,
}

/// List every `FeatureType` advertised by a capabilities document.
///
/// Names are taken as advertised (usually prefixed, e.g. `ne:roads`). All
/// discovered collections are marked editable; the caller narrows that down.
///
/// # Errors
/// Returns [`WfsError::Xml`] when the document is not well-formed.
pub fn parse_feature_types(document: &str, default_prefix: &str) -> Result<Vec<CollectionRef>> {
    let mut reader = Reader::from_str(document);
    let mut collections = Vec::new();
    let mut in_feature_type = false;
    let mut name: Option<String> = None;
    let mut title: Option<String> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"FeatureType" => {
                    in_feature_type = true;
                    name = None;
                    title = None;
                }
                b"Name" if in_feature_type => {
                    field = Some(Field::Name);
                    text.clear();
                }
                b"Title" if in_feature_type => {
                    field = Some(Field::Title);
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if field.is_some() => {
                let unescaped = e.unescape().map_err(|err| WfsError::Xml(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"Name" | b"Title" if field.is_some() => {
                    let value = text.trim().to_string();
                    match field.take() {
                        Some(Field::Name) if name.is_none() => name = Some(value),
                        Some(Field::Title) if title.is_none() => title = Some(value),
                        _ => {}
                    }
                }
                b"FeatureType" => {
                    in_feature_type = false;
                    if let Some(found) = name.take().filter(|n| !n.is_empty()) {
                        collections.push(
                            CollectionRef::new(&found, default_prefix, true)
                                .with_title(title.take().filter(|t| !t.is_empty())),
                        );
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(WfsError::Xml(err.to_string())),
            _ => {}
        }
    }

    Ok(collections)
}

#[cfg(test)]
mod tests {
    use super::parse_feature_types;

    #[test]
    fn lists_feature_types_with_titles() {
        let document = r#"<WFS_Capabilities version="1.0.0" xmlns="http://www.opengis.net/wfs">
  <Service><Name>WFS</Name><Title>GeoServer</Title></Service>
  <FeatureTypeList>
    <FeatureType><Name>ne:roads</Name><Title>Roads</Title><SRS>EPSG:4326</SRS></FeatureType>
    <FeatureType><Name>ne:IND_adm1</Name><Title></Title></FeatureType>
  </FeatureTypeList>
</WFS_Capabilities>"#;
        let collections = parse_feature_types(document, "ne").expect("parse");
        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].name, "roads");
        assert_eq!(collections[0].namespace_qualified_name, "ne:roads");
        assert_eq!(collections[0].label(), "Roads");
        assert_eq!(collections[1].title, None);
        assert_eq!(collections[1].label(), "IND_adm1");
    }

    #[test]
    fn service_name_is_not_a_collection() {
        let document = "<WFS_Capabilities><Service><Name>WFS</Name></Service></WFS_Capabilities>";
        assert!(parse_feature_types(document, "ne").expect("parse").is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_feature_types("<FeatureType><Name>x</Title>", "ne").is_err());
    }
}
