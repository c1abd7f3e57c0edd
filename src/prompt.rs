//! The fixed analysis instruction sent with every uploaded chart.
//!
//! The template is never interpolated; user input only selects the provider
//! and model, never the wording of the prompt.

pub const ANALYSIS_PROMPT: &str = "\
请扮演一位结合了“晚夜博主”趋势战法与“华尔街量化”因子的黄金分析师。
针对用户的 ETF (无杠杆) 交易需求，分析这张 K 线图。

【分析重点】：
1. **画线定位**：是蓝色急涨通道还是紫色稳涨通道？支撑位在哪里（MA30/前低）？
2. **量化排雷**：乖离率是否过大？MACD是否有顶背离？布林带是否变盘？
3. **操作建议**：ETF是买入、持有还是止盈？万金油抄底点位在哪里？

请输出清晰的 Markdown 报告。
";

/// Generation method a Gemini model must advertise to pass the capability probe.
pub const GENERATE_CAPABILITY: &str = "generateContent";
