//! Server-rendered upload form and result view.

use leafcheck_shared::Prediction;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexPage {
    pub message: Option<String>,
    pub prediction: Option<String>,
    pub confidence: Option<String>,
    pub image_path: Option<String>,
}

impl IndexPage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_result(prediction: &Prediction, image_path: impl Into<String>) -> Self {
        Self {
            message: None,
            prediction: Some(prediction.label.to_string()),
            confidence: Some(prediction.formatted_confidence()),
            image_path: Some(image_path.into()),
        }
    }

    pub fn render(&self) -> String {
        let mut body = String::new();

        if let Some(message) = &self.message {
            body.push_str(&format!(
                "    <p class=\"message\">{}</p>\n",
                escape_html(message)
            ));
        }

        if let Some(prediction) = &self.prediction {
            body.push_str("    <div class=\"result\">\n");
            if let Some(image_path) = &self.image_path {
                body.push_str(&format!(
                    "      <img src=\"{}\" alt=\"Uploaded leaf\" width=\"300\">\n",
                    escape_html(image_path)
                ));
            }
            body.push_str(&format!(
                "      <h2>Prediction: <span class=\"prediction\">{}</span></h2>\n",
                escape_html(prediction)
            ));
            if let Some(confidence) = &self.confidence {
                body.push_str(&format!(
                    "      <p>Confidence: <span class=\"confidence\">{}</span></p>\n",
                    escape_html(confidence)
                ));
            }
            body.push_str("    </div>\n");
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>Plant Disease Classifier</title>
  </head>
  <body>
    <h1>Plant Disease Classifier</h1>
    <form method="post" action="/" enctype="multipart/form-data">
      <input type="file" name="file" accept="image/*">
      <button type="submit">Upload and Predict</button>
    </form>
{body}  </body>
</html>
"#
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
