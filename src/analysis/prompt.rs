/// Instruction sent with every hotline recording
pub const HOTLINE_PROMPT: &str = r#"
**TASK**: Extract the color name, date, and summary from a recorded screening hotline message.
- Apart from the opening greeting and the closing message, the recording announces which color
  is scheduled for testing and on which date, e.g. "The color for Monday, April 6th is blue."
- Identify the single color name and the date announced after the opening greeting.
- Respond ONLY with a JSON object with exactly THREE keys:
  - "color": the announced color name as a lowercase string
  - "date": the announced date, e.g. "Wednesday, April 23rd" or "April 24th"
  - "summary": a brief summary of the announcement, leaving out the opening greeting and the
    closing voice mailbox message
- If no color is clearly identifiable, use "unknown" for "color".
- If no date is clearly identifiable, use "N/A" for "date".
- Example:

```json
{"color": "blue", "date": "Wednesday, April 23rd", "summary": "Testing for Blue is scheduled for Wednesday, April 23rd."}
```
"#;
