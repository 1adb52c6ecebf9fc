//! Page shown when Stripe redirects back after onboarding.
//!
//! The page only reflects a completion flag. Nothing account specific is
//! rendered.

const COMPLETE_TITLE: &str = "Stripe Account Setup Complete";
const INCOMPLETE_TITLE: &str = "Stripe Account Setup Incomplete";

const COMPLETE_MESSAGE: &str =
    "Your Stripe account has been successfully set up. You can now start receiving payments.";
const INCOMPLETE_MESSAGE: &str = "The account setup process was not completed. Please try again \
     in a few minutes. If the issue persists, contact support.";

pub fn render_return_page(onboarding_complete: bool) -> String {
    let (title, message_class, message) = if onboarding_complete {
        (COMPLETE_TITLE, "", COMPLETE_MESSAGE)
    } else {
        (INCOMPLETE_TITLE, "error", INCOMPLETE_MESSAGE)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Return to App</title>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{
            display: flex;
            flex-direction: column;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            padding: 20px;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            box-sizing: border-box;
        }}
        .heading {{
            font-size: clamp(20px, 5vw, 24px);
            font-weight: bold;
            margin-bottom: 20px;
            color: #333;
            text-align: center;
        }}
        .message {{
            font-size: clamp(14px, 4vw, 16px);
            color: #666;
            text-align: center;
            margin-bottom: 30px;
            max-width: 600px;
            line-height: 1.5;
        }}
        .close-instruction {{
            font-size: clamp(14px, 4vw, 16px);
            color: #4CAF50;
            text-align: center;
            margin-top: 20px;
        }}
        .error {{
            color: #d32f2f;
        }}
    </style>
</head>
<body>
    <h1 class="heading">{title}</h1>
    <p class="message {message_class}">{message}</p>
    <p class="close-instruction">You can now close this window and return to the app</p>
</body>
</html>
"#
    )
}
