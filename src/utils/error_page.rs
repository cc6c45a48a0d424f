use crate::models::qr_record::InvalidReason;

/// Which scanner-facing error page to render. The machine-readable status
/// stays the same within a class (404/410/500); only the copy differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Expired,
    Disabled,
    Internal,
}

impl From<InvalidReason> for ErrorPage {
    fn from(reason: InvalidReason) -> Self {
        match reason {
            InvalidReason::Expired => ErrorPage::Expired,
            InvalidReason::Disabled => ErrorPage::Disabled,
        }
    }
}

impl ErrorPage {
    fn copy(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ErrorPage::NotFound => (
                "QR Code Not Found",
                "This QR code does not exist or has been deleted.",
                "\u{1F50D}",
            ),
            ErrorPage::Expired => (
                "QR Code Expired",
                "This QR code has expired and is no longer active.",
                "\u{23F0}",
            ),
            ErrorPage::Disabled => (
                "QR Code Disabled",
                "This QR code has been disabled by its owner.",
                "\u{1F6AB}",
            ),
            ErrorPage::Internal => (
                "Something Went Wrong",
                "An error occurred while processing your request.",
                "\u{26A0}\u{FE0F}",
            ),
        }
    }

    pub fn render(&self) -> String {
        let (title, message, icon) = self.copy();
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - Smart QR Generator</title>
  <style>
    * {{ margin: 0; padding: 0; box-sizing: border-box; }}
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      min-height: 100vh;
      display: flex;
      align-items: center;
      justify-content: center;
      background: linear-gradient(135deg, #1a1a2e 0%, #16213e 50%, #0f3460 100%);
      color: #fff;
    }}
    .container {{ text-align: center; padding: 40px; max-width: 500px; }}
    .icon {{ font-size: 80px; margin-bottom: 20px; }}
    h1 {{ font-size: 28px; margin-bottom: 15px; }}
    p {{ font-size: 16px; color: #a0a0a0; line-height: 1.6; }}
    .card {{
      background: rgba(255, 255, 255, 0.05);
      border-radius: 20px;
      padding: 50px 40px;
      border: 1px solid rgba(255, 255, 255, 0.1);
    }}
    .footer {{ margin-top: 30px; font-size: 12px; color: #666; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="card">
      <div class="icon">{icon}</div>
      <h1>{title}</h1>
      <p>{message}</p>
      <p class="footer">Smart QR Generator</p>
    </div>
  </div>
</body>
</html>
"#
        )
    }
}
